use super::header::{Column, HeaderMatch};
use super::value::{non_empty, normalize_label, parse_amount, parse_number};
use super::{BudgetItem, CostCategory, Level};

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("")
}

/// Level of a row in the extended layout: one step per populated
/// categoria/subcategoria cell.
fn level_from_category_cells(categoria: &str, subcategoria: &str) -> Level {
    let populated = [categoria, subcategoria].iter().filter(|c| !c.is_empty()).count();
    Level::from_depth(populated as u8)
}

/// Level of a row in the compact layout, which has no category columns.
/// Codes three or more segments deep are always line items; shallower codes
/// are line items when they carry unit/quantity/price, otherwise the dot
/// depth decides between group and subgroup.
fn level_from_code(code: &str, has_values: bool) -> Level {
    let segments = code.split('.').filter(|s| !s.trim().is_empty()).count();
    if has_values || segments >= 3 {
        Level::Leaf
    } else if segments == 2 {
        Level::Subgroup
    } else {
        Level::Group
    }
}

// Normalized labels of the cost summary printed under the item table.
const SUMMARY_LABELS: &[&str] = &[
    "costodirecto",
    "gastosgenerales",
    "utilidad",
    "subtotal",
    "igv",
    "impuesto",
    "valorreferencial",
    "presupuestototal",
    "total",
];

/// A code-less row labelled like a cost summary line ends the item table.
fn is_summary_row(code: &str, description: &str) -> bool {
    if !code.is_empty() {
        return false;
    }
    let label = normalize_label(description);
    !label.is_empty() && SUMMARY_LABELS.iter().any(|l| label.starts_with(l))
}

/// Turn every non-empty row below the header into a [`BudgetItem`], linking
/// each to the nearest preceding row of strictly lower level.
pub fn classify_rows(grid: &[Vec<String>], header: &HeaderMatch) -> Vec<BudgetItem> {
    let col = |c: Column| header.get(c);
    let extended = header.has_category_columns();

    let mut items: Vec<BudgetItem> = Vec::new();
    // most recent item index seen at each depth
    let mut last_at: [Option<usize>; 3] = [None; 3];

    for (idx, row) in grid.iter().enumerate().skip(header.row + 1) {
        let code = cell(row, col(Column::Item));
        let description = cell(row, col(Column::Descripcion));
        if code.is_empty() && description.is_empty() {
            continue;
        }
        if is_summary_row(code, description) {
            tracing::debug!(row = idx + 1, label = description, "cost summary reached");
            break;
        }
        let categoria = cell(row, col(Column::Categoria));
        let subcategoria = cell(row, col(Column::Subcategoria));
        let unit = cell(row, col(Column::Unidad));
        let quantity = cell(row, col(Column::Metrado));
        let price = cell(row, col(Column::PrecioUnitario));
        let total = cell(row, col(Column::Parcial));

        let level = if extended {
            level_from_category_cells(categoria, subcategoria)
        } else {
            let has_values = [unit, quantity, price].iter().any(|c| !c.is_empty());
            level_from_code(code, has_values)
        };

        let description = non_empty(description)
            .or_else(|| non_empty(subcategoria))
            .or_else(|| non_empty(categoria))
            .unwrap_or("")
            .to_string();

        let depth = level.depth() as usize;
        let parent = last_at[..depth].iter().flatten().max().copied();

        let (unit, quantity, unit_price) = if level == Level::Leaf {
            (non_empty(unit).map(str::to_string), parse_number(quantity), parse_number(price))
        } else {
            (None, None, None)
        };

        let item_idx = items.len();
        items.push(BudgetItem {
            code: code.to_string(),
            description,
            unit,
            quantity,
            unit_price,
            total: parse_amount(total),
            category: CostCategory::Other,
            level,
            parent,
            row: idx + 1,
        });
        last_at[depth] = Some(item_idx);
        tracing::trace!(row = idx + 1, ?level, ?parent, "classified row");
    }

    infer_missing_codes(&mut items);
    items
}

/// Fill blank codes from the hierarchy: parent code plus a two digit ordinal
/// among siblings, or a top-level ordinal for rows without a parent.
pub fn infer_missing_codes(items: &mut [BudgetItem]) {
    let mut child_counts = vec![0usize; items.len()];
    let mut root_count = 0usize;
    for idx in 0..items.len() {
        let ordinal = match items[idx].parent {
            Some(p) => {
                child_counts[p] += 1;
                child_counts[p]
            }
            None => {
                root_count += 1;
                root_count
            }
        };
        if !items[idx].code.is_empty() {
            continue;
        }
        items[idx].code = match items[idx].parent {
            Some(p) => format!("{}.{ordinal:02}", items[p].code),
            None => format!("{ordinal:02}"),
        };
    }
}

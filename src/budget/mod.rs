//! Budget (presupuesto) spreadsheet ingestion.
//!
//! A budget sheet is a flat list of rows that encodes a three level cost
//! hierarchy: groups, subgroups and line items. Parsing runs in one pass:
//! locate the header row, classify every row below it into a [`BudgetItem`]
//! with an arena-index parent, roll leaf totals up into their ancestors and
//! tag leaves with a coarse [`CostCategory`].

pub mod cost_category;
pub mod header;
pub mod rows;
pub mod tree;
pub mod validation;
pub mod value;
pub mod workbook;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExpedienteError, Result};

pub use cost_category::CostCategory;
pub use header::HeaderConfig;

/// Position of a row in the budget hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Group,
    Subgroup,
    Leaf,
}

impl Level {
    pub fn depth(self) -> u8 {
        match self {
            Self::Group => 0,
            Self::Subgroup => 1,
            Self::Leaf => 2,
        }
    }

    pub fn from_depth(depth: u8) -> Self {
        match depth {
            0 => Self::Group,
            1 => Self::Subgroup,
            _ => Self::Leaf,
        }
    }

    pub fn is_group(self) -> bool {
        self != Self::Leaf
    }
}

/// One parsed budget row. `parent` indexes into the list the item lives in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub code: String,
    pub description: String,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total: f64,
    pub category: CostCategory,
    pub level: Level,
    pub parent: Option<usize>,
    /// 1-based row number in the source sheet (0 for rows loaded from the database).
    pub row: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedBudget {
    pub sheet: String,
    /// 1-based row number of the detected header.
    pub header_row: usize,
    pub items: Vec<BudgetItem>,
}

/// Run the full pipeline over an in-memory grid of cells.
pub fn parse_grid(grid: &[Vec<String>], config: &HeaderConfig) -> Result<(usize, Vec<BudgetItem>)> {
    let header = header::locate_header(grid, config)?;
    let mut items = rows::classify_rows(grid, &header);
    tree::aggregate(&mut items);
    cost_category::classify(&mut items);
    Ok((header.row + 1, items))
}

/// Parse a budget workbook from its raw bytes. Pure: the same bytes always
/// yield the same items.
pub fn parse_workbook_bytes(bytes: &[u8], config: &HeaderConfig) -> Result<ParsedBudget> {
    let (sheet, grid) = workbook::read_budget_sheet(bytes)?;
    let (header_row, items) = parse_grid(&grid, config)?;
    tracing::debug!(sheet = %sheet, header_row, items = items.len(), "parsed budget sheet");
    Ok(ParsedBudget {
        sheet,
        header_row,
        items,
    })
}

pub fn parse_file(path: &Path, config: &HeaderConfig) -> Result<ParsedBudget> {
    if !workbook::is_spreadsheet(path) {
        return Err(ExpedienteError::UnsupportedFile(format!(
            "{} (budgets must be .xlsx or .xls)",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    parse_workbook_bytes(&bytes, config)
}

/// Workbook builders shared by the budget tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use rust_xlsxwriter::Workbook;

    pub const SIX_COLUMN_HEADER: [&str; 6] =
        ["Item", "Descripción", "Und.", "Metrado", "P.U.", "Parcial"];

    pub const EIGHT_COLUMN_HEADER: [&str; 8] = [
        "Item",
        "Categoría",
        "Subcategoría",
        "Descripción",
        "Unidad",
        "Metrado",
        "Precio Unitario",
        "Parcial",
    ];

    pub fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    /// Write `rows` into a sheet named `sheet_name` starting at `first_row`
    /// (0-based) and return the xlsx bytes.
    pub fn workbook_bytes(sheet_name: &str, first_row: u32, rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).unwrap();
        sheet.write_string(0, 0, "PRESUPUESTO DE OBRA").unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let (r, c) = (first_row + r as u32, c as u16);
                // codes stay text; only the value columns are written as numbers
                match value.parse::<f64>() {
                    Ok(n) if c >= 2 => {
                        sheet.write_number(r, c, n).unwrap();
                    }
                    _ => {
                        sheet.write_string(r, c, *value).unwrap();
                    }
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }
}

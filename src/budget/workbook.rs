use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};

use crate::error::{ExpedienteError, Result};

/// Substring (case-insensitive) a worksheet name must contain to be read as a budget.
pub const BUDGET_SHEET: &str = "presupuesto";

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SPREADSHEET_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Render a cell as text. Whole floats print without a fractional part so
/// numeric codes and quantities read the way they appear in the sheet.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// Open a workbook from bytes and return the first sheet whose name contains
/// [`BUDGET_SHEET`], as a grid addressed by absolute sheet coordinates.
pub fn read_budget_sheet(bytes: &[u8]) -> Result<(String, Vec<Vec<String>>)> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names().to_owned();
    let sheet = names
        .iter()
        .find(|n| n.to_lowercase().contains(BUDGET_SHEET))
        .cloned()
        .ok_or_else(|| ExpedienteError::MissingSheet {
            wanted: BUDGET_SHEET.to_string(),
            found: names.join(", "),
        })?;

    let range = workbook.worksheet_range(&sheet)?;
    // calamine ranges start at the first used cell; pad back to A1 so row
    // numbers match what the user sees.
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let width = col_offset + range.width();

    let mut grid: Vec<Vec<String>> = vec![vec![String::new(); width]; row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_to_string));
        grid.push(cells);
    }
    tracing::debug!(sheet = %sheet, rows = grid.len(), width, "read budget sheet");
    Ok((sheet, grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::fixtures::workbook_bytes;

    #[test]
    fn test_is_spreadsheet() {
        assert!(is_spreadsheet(Path::new("a/presupuesto.xlsx")));
        assert!(is_spreadsheet(Path::new("PRESUPUESTO.XLS")));
        assert!(!is_spreadsheet(Path::new("memoria.pdf")));
        assert!(!is_spreadsheet(Path::new("noext")));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(500.0)), "500");
        assert_eq!(cell_to_string(&Data::Float(5.25)), "5.25");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String("  m2 ".into())), "m2");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_read_budget_sheet_keeps_absolute_rows() {
        let bytes = workbook_bytes("Hoja Presupuesto", 5, &[&["Item", "Descripción"]]);
        let (name, grid) = read_budget_sheet(&bytes).unwrap();
        assert_eq!(name, "Hoja Presupuesto");
        assert_eq!(grid[0][0], "PRESUPUESTO DE OBRA");
        assert_eq!(grid[5][0], "Item");
        assert_eq!(grid[5][1], "Descripción");
    }

    #[test]
    fn test_read_budget_sheet_rejects_garbage() {
        let err = read_budget_sheet(b"not a workbook").unwrap_err();
        assert!(matches!(err, ExpedienteError::Xlsx(_)));
    }
}

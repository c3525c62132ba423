use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::normalize_label;
use crate::error::{ExpedienteError, Result};

/// Logical budget columns, in the order they usually appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Item,
    Categoria,
    Subcategoria,
    Descripcion,
    Unidad,
    Metrado,
    PrecioUnitario,
    Parcial,
}

/// Columns every budget header must carry. Categoria/Subcategoria only
/// appear in the extended layout.
pub const REQUIRED: &[Column] = &[
    Column::Item,
    Column::Descripcion,
    Column::Unidad,
    Column::Metrado,
    Column::PrecioUnitario,
    Column::Parcial,
];

// Normalized synonyms. Entries shorter than 4 chars only match exactly.
const SYNONYMS: &[(Column, &[&str])] = &[
    (Column::Item, &["item", "items", "codigo", "cod", "partida", "nro"]),
    (Column::Categoria, &["categoria", "grupo"]),
    (Column::Subcategoria, &["subcategoria", "subgrupo"]),
    (Column::Descripcion, &["descripcion", "detalle", "concepto"]),
    (Column::Unidad, &["und", "unid", "unidad", "um", "undmedida"]),
    (Column::Metrado, &["metrado", "cantidad", "cant"]),
    (Column::PrecioUnitario, &["pu", "preciounitario", "precio", "costounitario", "punit"]),
    (Column::Parcial, &["parcial", "total", "subtotal", "costototal", "preciototal", "importe"]),
];

/// How to look for the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Number of leading rows scanned when `fixed_row` is unset.
    pub search_rows: usize,
    /// 0-based row that must hold the header. Disables scanning.
    pub fixed_row: Option<usize>,
    /// Minimum number of bound columns for a row to qualify.
    pub min_matches: usize,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            search_rows: 20,
            fixed_row: None,
            min_matches: REQUIRED.len(),
        }
    }
}

/// The detected header row and where each logical column lives.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    /// 0-based row index of the header.
    pub row: usize,
    pub columns: BTreeMap<Column, usize>,
}

impl HeaderMatch {
    pub fn get(&self, column: Column) -> Option<usize> {
        self.columns.get(&column).copied()
    }

    /// Whether the sheet uses the extended layout with explicit
    /// categoria/subcategoria columns.
    pub fn has_category_columns(&self) -> bool {
        self.columns.contains_key(&Column::Categoria) || self.columns.contains_key(&Column::Subcategoria)
    }
}

/// Best column for a single header cell, if any.
pub fn match_label(raw: &str) -> Option<Column> {
    let label = normalize_label(raw);
    if label.is_empty() {
        return None;
    }
    let mut best: Option<(usize, Column)> = None;
    for (column, synonyms) in SYNONYMS {
        for syn in *synonyms {
            let score = if label == *syn {
                1000 + syn.len()
            } else if syn.len() >= 4 && label.contains(syn) {
                syn.len()
            } else {
                continue;
            };
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, *column));
            }
        }
    }
    best.map(|(_, column)| column)
}

fn match_row(row: &[String]) -> BTreeMap<Column, usize> {
    let mut columns = BTreeMap::new();
    for (idx, cell) in row.iter().enumerate() {
        if let Some(column) = match_label(cell) {
            columns.entry(column).or_insert(idx);
        }
    }
    columns
}

fn qualifies(columns: &BTreeMap<Column, usize>, config: &HeaderConfig) -> bool {
    REQUIRED.iter().all(|c| columns.contains_key(c)) && columns.len() >= config.min_matches
}

/// Find the header row in `grid`.
///
/// With `fixed_row` set only that row is examined; otherwise the first
/// `search_rows` rows are scanned and the first qualifying row wins.
pub fn locate_header(grid: &[Vec<String>], config: &HeaderConfig) -> Result<HeaderMatch> {
    let candidates = match config.fixed_row {
        Some(row) if row >= grid.len() => {
            return Err(ExpedienteError::HeaderRowMissing {
                row: row + 1,
                rows: grid.len(),
            });
        }
        Some(row) => row..row + 1,
        None => 0..config.search_rows.min(grid.len()),
    };
    let searched = candidates.len();

    let mut best = 0;
    for idx in candidates {
        let row = &grid[idx];
        let columns = match_row(row);
        tracing::debug!(row = idx + 1, cells = ?row, matched = columns.len(), "header candidate");
        if qualifies(&columns, config) {
            tracing::debug!(row = idx + 1, columns = ?columns, "header located");
            return Ok(HeaderMatch { row: idx, columns });
        }
        best = best.max(columns.len());
    }

    Err(ExpedienteError::HeaderNotFound {
        searched,
        best,
        required: config.min_matches.max(REQUIRED.len()),
    })
}

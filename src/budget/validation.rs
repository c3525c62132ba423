use serde::Serialize;

use super::tree::{duplicate_group_descriptions, root_group};
use super::{BudgetItem, Level};

/// Outcome of checking a parsed budget. Only errors block persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub is_valid: bool,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}

fn missing_fields(item: &BudgetItem) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if item.unit.as_deref().map_or(true, |u| u.trim().is_empty()) {
        missing.push("unit");
    }
    if item.quantity.is_none() {
        missing.push("quantity");
    }
    if item.unit_price.is_none() {
        missing.push("unit price");
    }
    missing
}

pub fn validate(items: &[BudgetItem]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if items.is_empty() {
        report
            .errors
            .push("No valid rows found below the header".to_string());
        return report.finish();
    }

    for (idx, item) in items.iter().enumerate() {
        if item.level != Level::Leaf {
            continue;
        }
        if root_group(items, idx).is_none() {
            report.errors.push(format!(
                "Row {} ({} {}) is not under any top-level group",
                item.row, item.code, item.description
            ));
        }
        let missing = missing_fields(item);
        if !missing.is_empty() {
            report.warnings.push(format!(
                "Row {} ({} {}) is missing {}",
                item.row,
                item.code,
                item.description,
                missing.join(", ")
            ));
        }
    }

    for (description, rows) in duplicate_group_descriptions(items) {
        let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        report.warnings.push(format!(
            "Group \"{description}\" appears on rows {}; totals are kept per row",
            rows.join(", ")
        ));
    }

    if !report.errors.is_empty() {
        tracing::warn!(errors = report.errors.len(), "budget failed validation");
    }
    report.finish()
}

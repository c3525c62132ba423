use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::budget::cost_category::CategoryTotal;
use crate::budget::validation::ValidationReport;
use crate::error::Result;
use crate::expediente::{self, PreviewResponse};
use crate::fmt::money;
use crate::settings::load_settings;

use super::presupuesto::budget_table;

pub fn run(file: &str, category: &str, convenio: i64, json: bool) -> Result<()> {
    let settings = load_settings();
    let result = expediente::preview(&PathBuf::from(file), category, convenio, &settings);
    if json {
        return super::print_json(result);
    }
    println!("{}", render(&result?));
    Ok(())
}

pub(crate) fn render(resp: &PreviewResponse) -> String {
    let meta = &resp.metadata;
    let mut out = format!(
        "{}\nSheet \"{}\", header on row {}, {} rows, convenio {} ({})\n{}\n",
        "Budget preview".bold(),
        meta.sheet,
        meta.header_row,
        meta.item_count,
        meta.convenio_id,
        meta.category,
        budget_table(&resp.items, None),
    );
    out.push_str(&format!("{} {}\n", "Grand total:".bold(), money(meta.grand_total)));
    out.push_str(&category_table(&resp.categories));
    out.push('\n');
    out.push_str(&validation_text(&resp.validation));
    out
}

pub(crate) fn category_table(totals: &[CategoryTotal]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "%", "Items"]);
    for t in totals {
        table.add_row(vec![
            Cell::new(t.category.label()),
            Cell::new(money(t.total)),
            Cell::new(format!("{:.1}%", t.pct)),
            Cell::new(t.count),
        ]);
    }
    table.to_string()
}

pub(crate) fn validation_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    for e in &report.errors {
        out.push_str(&format!("{} {e}\n", "error:".red().bold()));
    }
    for w in &report.warnings {
        out.push_str(&format!("{} {w}\n", "warning:".yellow()));
    }
    if report.is_valid {
        out.push_str(&format!("{}\n", "Budget is valid.".green()));
    } else {
        out.push_str(&format!("{}\n", "Budget is not valid and would be rejected on upload.".red()));
    }
    out
}

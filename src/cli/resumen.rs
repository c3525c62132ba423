use colored::Colorize;

use crate::budget::cost_category::category_totals;
use crate::budget::tree::grand_total;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;

use super::preview::category_table;

pub fn run(convenio: i64, json: bool) -> Result<()> {
    let settings = load_settings();
    let result = super::open_db(&settings)
        .and_then(|conn| super::saved_budget(&conn, convenio));
    if json {
        return super::print_json(result.map(|items| category_totals(&items)));
    }

    let items = result?;
    println!("{}", format!("Budget summary, convenio {convenio}").bold());
    println!("{}", category_table(&category_totals(&items)));
    println!("{} {}", "Grand total:".bold(), money(grand_total(&items)));
    Ok(())
}

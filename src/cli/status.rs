use crate::db::{get_connection, get_metadata};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Budget cat: {}", settings.budget_category);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;

        let initialized = get_metadata(&conn, "initialized_at");
        println!("Created:    {}", initialized.as_deref().unwrap_or("(unknown)"));

        let convenios: i64 = conn.query_row(
            "SELECT count(DISTINCT convenio_id) FROM budget_groups",
            [],
            |r| r.get(0),
        )?;
        let groups: i64 = conn.query_row("SELECT count(*) FROM budget_groups", [], |r| r.get(0))?;
        let items: i64 = conn.query_row("SELECT count(*) FROM budget_items", [], |r| r.get(0))?;
        let files: i64 = conn.query_row("SELECT count(*) FROM expediente_files", [], |r| r.get(0))?;

        println!();
        println!("Budgets:       {convenios}");
        println!("Groups:        {groups}");
        println!("Items:         {items}");
        println!("Files:         {files}");
    } else {
        println!();
        println!("Database not found. Run `expediente init` to set up.");
    }

    Ok(())
}

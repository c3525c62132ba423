use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;
use crate::store::list_files;

pub fn run(convenio: i64) -> Result<()> {
    let settings = load_settings();
    let conn = super::open_db(&settings)?;
    let files = list_files(&conn, convenio)?;
    if files.is_empty() {
        println!("No files stored for convenio {convenio}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Category", "File", "Size", "Uploaded", "SHA-256"]);
    for f in &files {
        table.add_row(vec![
            Cell::new(f.id),
            Cell::new(&f.category),
            Cell::new(&f.filename),
            Cell::new(format_bytes(f.size_bytes.max(0) as u64)),
            Cell::new(&f.uploaded_at),
            Cell::new(&f.checksum[..f.checksum.len().min(12)]),
        ]);
    }
    println!("Files for convenio {convenio}\n{table}");
    Ok(())
}

use std::path::PathBuf;

use crate::db::{get_connection, get_metadata, init_db, set_metadata};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(settings.files_dir())?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;
    if get_metadata(&conn, "initialized_at").is_none() {
        set_metadata(&conn, "initialized_at", &chrono::Local::now().to_rfc3339())?;
    }
    tracing::debug!(db = %settings.db_path().display(), "schema ready");

    println!("Initialized expediente at {}", resolved.display());
    Ok(())
}

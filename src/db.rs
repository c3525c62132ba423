use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS expediente_files (
    id INTEGER PRIMARY KEY,
    convenio_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    filename TEXT NOT NULL,
    stored_path TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    uploaded_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS budget_groups (
    id INTEGER PRIMARY KEY,
    convenio_id INTEGER NOT NULL,
    parent_id INTEGER,
    position INTEGER NOT NULL,
    level INTEGER NOT NULL,
    code TEXT NOT NULL,
    description TEXT NOT NULL,
    total REAL NOT NULL DEFAULT 0,
    source_row INTEGER,
    FOREIGN KEY (parent_id) REFERENCES budget_groups(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS budget_items (
    id INTEGER PRIMARY KEY,
    convenio_id INTEGER NOT NULL,
    group_id INTEGER,
    position INTEGER NOT NULL,
    code TEXT NOT NULL,
    description TEXT NOT NULL,
    unit TEXT,
    quantity REAL,
    unit_price REAL,
    total REAL NOT NULL DEFAULT 0,
    cost_category TEXT NOT NULL DEFAULT 'other',
    source_row INTEGER,
    FOREIGN KEY (group_id) REFERENCES budget_groups(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_files_convenio ON expediente_files(convenio_id, category);
CREATE INDEX IF NOT EXISTS idx_groups_convenio ON budget_groups(convenio_id);
CREATE INDEX IF NOT EXISTS idx_items_convenio ON budget_items(convenio_id);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |r| r.get(0))
        .optional()
        .ok()
        .flatten()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["metadata", "expediente_files", "budget_groups", "budget_items"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_metadata_upsert() {
        let (_dir, conn) = test_db();
        assert_eq!(get_metadata(&conn, "entidad"), None);
        set_metadata(&conn, "entidad", "Municipalidad A").unwrap();
        set_metadata(&conn, "entidad", "Municipalidad B").unwrap();
        assert_eq!(get_metadata(&conn, "entidad").as_deref(), Some("Municipalidad B"));
    }
}

use serde::Serialize;

/// A file attached to a convenio's expediente.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub id: i64,
    pub convenio_id: i64,
    pub category: String,
    pub filename: String,
    pub stored_path: String,
    pub size_bytes: i64,
    pub checksum: String,
    pub uploaded_at: String,
}

/// Row counts written by one budget commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedBudget {
    pub groups: usize,
    pub items: usize,
}

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    #[default]
    Pending,
    Uploading,
    Done,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryUpload {
    pub files: Vec<PathBuf>,
    pub stored: Vec<String>,
    pub status: UploadStatus,
    pub error: Option<String>,
}

/// Progress of one upload request, keyed by category label.
///
/// Created per request and handed to the upload service, which reports each
/// step through it; callers read it back for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadSession {
    categories: BTreeMap<String, CategoryUpload>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, category: &str) -> &mut CategoryUpload {
        self.categories.entry(category.to_string()).or_default()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryUpload> {
        self.categories.get(category)
    }

    pub fn files(&self, category: &str) -> &[PathBuf] {
        self.get(category).map(|c| c.files.as_slice()).unwrap_or(&[])
    }

    pub fn set_files(&mut self, category: &str, files: Vec<PathBuf>) {
        let entry = self.entry(category);
        entry.files = files;
        entry.stored.clear();
        entry.status = UploadStatus::Pending;
        entry.error = None;
    }

    pub fn status(&self, category: &str) -> UploadStatus {
        self.get(category).map(|c| c.status).unwrap_or_default()
    }

    pub fn set_status(&mut self, category: &str, status: UploadStatus) {
        self.entry(category).status = status;
    }

    pub fn push_stored(&mut self, category: &str, name: String) {
        self.entry(category).stored.push(name);
    }

    pub fn set_error(&mut self, category: &str, error: impl Into<String>) {
        let entry = self.entry(category);
        entry.error = Some(error.into());
        entry.status = UploadStatus::Failed;
    }

    pub fn error(&self, category: &str) -> Option<&str> {
        self.get(category).and_then(|c| c.error.as_deref())
    }

    pub fn mark_complete(&mut self, category: &str) {
        let entry = self.entry(category);
        entry.status = UploadStatus::Done;
        entry.error = None;
    }

    pub fn is_complete(&self, category: &str) -> bool {
        self.status(category) == UploadStatus::Done
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &CategoryUpload)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_defaults() {
        let session = UploadSession::new();
        assert_eq!(session.status("planos"), UploadStatus::Pending);
        assert!(session.files("planos").is_empty());
        assert!(!session.is_complete("planos"));
        assert_eq!(session.error("planos"), None);
    }

    #[test]
    fn test_lifecycle() {
        let mut session = UploadSession::new();
        session.set_files("presupuesto", vec![PathBuf::from("a.xlsx")]);
        session.set_status("presupuesto", UploadStatus::Uploading);
        session.push_stored("presupuesto", "a.xlsx".into());
        session.mark_complete("presupuesto");
        assert!(session.is_complete("presupuesto"));
        assert_eq!(session.get("presupuesto").unwrap().stored, vec!["a.xlsx"]);
    }

    #[test]
    fn test_categories_are_independent() {
        let mut session = UploadSession::new();
        session.set_files("planos", vec![PathBuf::from("p.pdf")]);
        session.set_error("presupuesto", "header not found");
        assert_eq!(session.status("presupuesto"), UploadStatus::Failed);
        assert_eq!(session.error("presupuesto"), Some("header not found"));
        assert_eq!(session.status("planos"), UploadStatus::Pending);
        assert_eq!(session.categories().count(), 2);
    }

    #[test]
    fn test_set_files_resets_failure() {
        let mut session = UploadSession::new();
        session.set_error("memoria", "too large");
        session.set_files("memoria", vec![PathBuf::from("m.docx")]);
        assert_eq!(session.status("memoria"), UploadStatus::Pending);
        assert_eq!(session.error("memoria"), None);
    }
}

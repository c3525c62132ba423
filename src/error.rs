use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpedienteError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("No worksheet containing \"{wanted}\" (found: {found})")]
    MissingSheet { wanted: String, found: String },

    #[error("Header row {row} does not exist (sheet has {rows} rows)")]
    HeaderRowMissing { row: usize, rows: usize },

    #[error("Header row not found in the first {searched} rows (best candidate matched {best} of {required} required columns)")]
    HeaderNotFound {
        searched: usize,
        best: usize,
        required: usize,
    },

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: u64, limit: u64 },

    #[error("Budget has {} error(s): {}", .0.len(), .0.join("; "))]
    InvalidBudget(Vec<String>),

    #[error("{0}")]
    Other(String),
}

impl ExpedienteError {
    /// Short category label used as the `error` field of [`ErrorResponse`].
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Db(_) => "database_error",
            Self::Io(_) => "io_error",
            Self::Xlsx(_) | Self::MissingSheet { .. } | Self::HeaderRowMissing { .. } | Self::HeaderNotFound { .. } => {
                "format_error"
            }
            Self::Json(_) | Self::Settings(_) => "settings_error",
            Self::UnsupportedFile(_) | Self::UploadTooLarge { .. } => "rejected_upload",
            Self::InvalidBudget(_) => "invalid_budget",
            Self::Other(_) => "error",
        }
    }
}

/// Failure shape returned to callers that asked for JSON output.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl From<&ExpedienteError> for ErrorResponse {
    fn from(e: &ExpedienteError) -> Self {
        Self {
            error: e.kind().to_string(),
            details: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpedienteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let err = ExpedienteError::HeaderNotFound {
            searched: 20,
            best: 3,
            required: 6,
        };
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.error, "format_error");
        assert!(resp.details.contains("first 20 rows"));
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("error").is_some());
        assert!(json.get("details").is_some());
    }

    #[test]
    fn test_invalid_budget_lists_errors() {
        let err = ExpedienteError::InvalidBudget(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Budget has 2 error(s): a; b");
    }
}

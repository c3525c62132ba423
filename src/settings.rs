use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::budget::HeaderConfig;
use crate::error::{ExpedienteError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Upload category whose spreadsheets are parsed as budgets.
    #[serde(default = "default_budget_category")]
    pub budget_category: String,
    #[serde(default = "default_header_search_rows")]
    pub header_search_rows: usize,
    /// 0-based row holding the header; unset means scan.
    #[serde(default)]
    pub header_fixed_row: Option<usize>,
    #[serde(default = "default_header_min_matches")]
    pub header_min_matches: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_budget_category() -> String {
    "presupuesto".to_string()
}

fn default_header_search_rows() -> usize {
    HeaderConfig::default().search_rows
}

fn default_header_min_matches() -> usize {
    HeaderConfig::default().min_matches
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["xlsx", "xls", "pdf", "doc", "docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            budget_category: default_budget_category(),
            header_search_rows: default_header_search_rows(),
            header_fixed_row: None,
            header_min_matches: default_header_min_matches(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Settings {
    pub fn header_config(&self) -> HeaderConfig {
        HeaderConfig {
            search_rows: self.header_search_rows,
            fixed_row: self.header_fixed_row,
            min_matches: self.header_min_matches,
        }
    }

    pub fn is_budget_category(&self, category: &str) -> bool {
        category.trim().eq_ignore_ascii_case(self.budget_category.trim())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("expediente.db")
    }

    pub fn files_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("expedientes")
    }
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("EXPEDIENTE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("expediente")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("expediente")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ExpedienteError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

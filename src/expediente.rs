//! Preview and upload flows for expediente files.
//!
//! `preview` parses a budget spreadsheet and reports on it without touching
//! the database. `upload` stores files under the convenio's folder, records
//! them, and for budget-category spreadsheets commits the parsed budget.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::budget::cost_category::{category_totals, CategoryTotal};
use crate::budget::tree::grand_total;
use crate::budget::validation::{validate, ValidationReport};
use crate::budget::{self, workbook, BudgetItem};
use crate::error::{ExpedienteError, Result};
use crate::models::SavedBudget;
use crate::session::{UploadSession, UploadStatus};
use crate::settings::Settings;
use crate::store::{self, NewFile};

#[derive(Debug, Serialize)]
pub struct PreviewMetadata {
    pub category: String,
    pub convenio_id: i64,
    pub sheet: String,
    pub header_row: usize,
    pub item_count: usize,
    pub grand_total: f64,
    pub generated_at: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub items: Vec<BudgetItem>,
    pub validation: ValidationReport,
    pub categories: Vec<CategoryTotal>,
    pub metadata: PreviewMetadata,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub files: Vec<String>,
    pub budget: Option<SavedBudget>,
    pub warnings: Vec<String>,
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Folder-safe version of a category label.
pub fn folder_name(category: &str) -> String {
    let cleaned: String = category
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "general".to_string()
    } else {
        cleaned.to_lowercase()
    }
}

/// Reject uploads with a disallowed extension or a combined size over the limit.
pub fn check_upload(files: &[PathBuf], settings: &Settings) -> Result<u64> {
    if files.is_empty() {
        return Err(ExpedienteError::Other("No files to upload".into()));
    }
    let mut total = 0u64;
    for file in files {
        let ext = extension_of(file);
        if !settings.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
            return Err(ExpedienteError::UnsupportedFile(format!(
                "{} (allowed: {})",
                file.display(),
                settings.allowed_extensions.join(", ")
            )));
        }
        total += std::fs::metadata(file)?.len();
    }
    if total > settings.max_upload_bytes {
        return Err(ExpedienteError::UploadTooLarge {
            size: total,
            limit: settings.max_upload_bytes,
        });
    }
    Ok(total)
}

pub fn preview(path: &Path, category: &str, convenio_id: i64, settings: &Settings) -> Result<PreviewResponse> {
    let parsed = budget::parse_file(path, &settings.header_config())?;
    let validation = validate(&parsed.items);
    let categories = category_totals(&parsed.items);
    let metadata = PreviewMetadata {
        category: category.to_string(),
        convenio_id,
        sheet: parsed.sheet,
        header_row: parsed.header_row,
        item_count: parsed.items.len(),
        grand_total: grand_total(&parsed.items),
        generated_at: chrono::Local::now().to_rfc3339(),
    };
    Ok(PreviewResponse {
        items: parsed.items,
        validation,
        categories,
        metadata,
    })
}

/// Store `files` for `convenio_id` under `category` and commit any budget
/// they carry. Progress is reported through `session`.
///
/// Files copied before a failure are left on disk.
pub fn upload(
    conn: &mut Connection,
    settings: &Settings,
    session: &mut UploadSession,
    files: &[PathBuf],
    category: &str,
    convenio_id: i64,
) -> Result<UploadResponse> {
    session.set_files(category, files.to_vec());
    let result = upload_inner(conn, settings, session, files, category, convenio_id);
    match &result {
        Ok(_) => session.mark_complete(category),
        Err(e) => session.set_error(category, e.to_string()),
    }
    result
}

fn upload_inner(
    conn: &mut Connection,
    settings: &Settings,
    session: &mut UploadSession,
    files: &[PathBuf],
    category: &str,
    convenio_id: i64,
) -> Result<UploadResponse> {
    check_upload(files, settings)?;
    session.set_status(category, UploadStatus::Uploading);

    let dest_dir = settings
        .files_dir()
        .join(convenio_id.to_string())
        .join(folder_name(category));
    std::fs::create_dir_all(&dest_dir)?;

    let is_budget = settings.is_budget_category(category);
    let mut response = UploadResponse {
        files: Vec::new(),
        budget: None,
        warnings: Vec::new(),
    };

    for file in files {
        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExpedienteError::Other(format!("Invalid file name: {}", file.display())))?
            .to_string();
        let data = std::fs::read(file)?;
        let dest = dest_dir.join(&filename);
        std::fs::write(&dest, &data)?;
        let stored_path = dest.to_string_lossy().to_string();
        store::record_file(
            conn,
            &NewFile {
                convenio_id,
                category,
                filename: &filename,
                stored_path: &stored_path,
                size_bytes: data.len() as u64,
                checksum: &compute_checksum(&data),
            },
        )?;
        tracing::info!(convenio_id, category, file = %filename, "stored expediente file");

        if is_budget && workbook::is_spreadsheet(file) {
            let parsed = budget::parse_workbook_bytes(&data, &settings.header_config())?;
            let report = validate(&parsed.items);
            if !report.is_valid {
                return Err(ExpedienteError::InvalidBudget(report.errors));
            }
            response.warnings.extend(report.warnings);
            response.budget = Some(store::save_budget(conn, convenio_id, &parsed.items)?);
        } else if is_budget {
            tracing::warn!(file = %filename, "budget category file is not a spreadsheet, stored only");
        }

        session.push_stored(category, filename.clone());
        response.files.push(filename);
    }
    Ok(response)
}

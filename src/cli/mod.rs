pub mod files;
pub mod init;
pub mod preview;
pub mod presupuesto;
pub mod resumen;
pub mod status;
pub mod upload;

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;

use crate::budget::BudgetItem;
use crate::db::get_connection;
use crate::error::{ErrorResponse, ExpedienteError, Result};
use crate::settings::Settings;
use crate::store::{has_budget, load_budget};

#[derive(Parser)]
#[command(
    name = "expediente",
    version,
    about = "Budget spreadsheet ingestion and dossier files for public works agreements."
)]
pub struct Cli {
    /// Log parsing and persistence details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for expediente data (default: ~/Documents/expediente)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Parse a budget spreadsheet and report on it without saving anything.
    Preview {
        /// Path to the .xlsx/.xls budget
        file: String,
        /// Upload category the file would be filed under
        #[arg(long, default_value = "presupuesto")]
        category: String,
        /// Convenio (agreement) id
        #[arg(long)]
        convenio: i64,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store files in a convenio's dossier; budget spreadsheets are parsed and saved.
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<String>,
        /// Upload category, e.g. presupuesto, planos, memoria
        #[arg(long)]
        category: String,
        /// Convenio (agreement) id
        #[arg(long)]
        convenio: i64,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a convenio's saved budget as a collapsible tree.
    Presupuesto {
        /// Convenio (agreement) id
        #[arg(long)]
        convenio: i64,
        /// Plain text output even on a terminal
        #[arg(long)]
        text: bool,
        /// Group code to render collapsed (repeatable)
        #[arg(long)]
        collapse: Vec<String>,
    },
    /// Show a convenio's budget totals per cost category.
    Resumen {
        /// Convenio (agreement) id
        #[arg(long)]
        convenio: i64,
        /// Print the totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the files stored for a convenio.
    Files {
        /// Convenio (agreement) id
        #[arg(long)]
        convenio: i64,
    },
    /// Show current data directory, database and summary counts.
    Status,
}

/// Open the configured database, failing with a hint when `init` never ran.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(ExpedienteError::Settings(format!(
            "No database found at {}\nRun `expediente init` to create one.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

/// Load the budget saved for `convenio`, failing when none was uploaded.
pub(crate) fn saved_budget(conn: &Connection, convenio: i64) -> Result<Vec<BudgetItem>> {
    if !has_budget(conn, convenio)? {
        return Err(ExpedienteError::Other(format!(
            "No budget saved for convenio {convenio}"
        )));
    }
    load_budget(conn, convenio)
}

/// Print `result` as JSON, using the error shape on failure. The error is
/// still returned so the process exits non-zero.
pub(crate) fn print_json<T: Serialize>(result: Result<T>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_saved_budget_requires_an_upload() {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("t.db")).unwrap();
        crate::db::init_db(&conn).unwrap();
        let err = saved_budget(&conn, 4).unwrap_err();
        assert_eq!(err.to_string(), "No budget saved for convenio 4");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upload_requires_files() {
        let parsed = Cli::try_parse_from(["expediente", "upload", "--category", "planos", "--convenio", "1"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_collapse_is_repeatable() {
        let cli = Cli::try_parse_from([
            "expediente", "presupuesto", "--convenio", "3", "--collapse", "01", "--collapse", "02.01",
        ])
        .unwrap();
        match cli.command {
            Commands::Presupuesto { convenio, collapse, text } => {
                assert_eq!(convenio, 3);
                assert_eq!(collapse, vec!["01", "02.01"]);
                assert!(!text);
            }
            _ => panic!("expected presupuesto"),
        }
    }

    #[test]
    fn test_preview_category_defaults_to_budget() {
        let cli = Cli::try_parse_from(["expediente", "preview", "p.xlsx", "--convenio", "1"]).unwrap();
        assert!(matches!(cli.command, Commands::Preview { ref category, .. } if category == "presupuesto"));
    }
}

use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::expediente::{self, UploadResponse};
use crate::session::UploadSession;
use crate::settings::load_settings;

pub fn run(files: &[String], category: &str, convenio: i64, json: bool) -> Result<()> {
    let settings = load_settings();
    let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
    let mut session = UploadSession::new();

    let result = super::open_db(&settings).and_then(|mut conn| {
        expediente::upload(&mut conn, &settings, &mut session, &paths, category, convenio)
    });
    if json {
        return super::print_json(result);
    }

    let resp = result?;
    println!("{}", render(&resp, &session, category, convenio));
    Ok(())
}

fn render(resp: &UploadResponse, session: &UploadSession, category: &str, convenio: i64) -> String {
    let mut out = String::new();
    for (label, entry) in session.categories() {
        out.push_str(&format!(
            "{label}: {} of {} file(s) stored\n",
            entry.stored.len(),
            session.files(label).len()
        ));
    }
    for name in &resp.files {
        out.push_str(&format!("  {} {name}\n", "stored".green()));
    }
    if let Some(saved) = resp.budget {
        out.push_str(&format!(
            "Budget saved for convenio {convenio}: {} groups, {} items\n",
            saved.groups, saved.items
        ));
    }
    for w in &resp.warnings {
        out.push_str(&format!("{} {w}\n", "warning:".yellow()));
    }
    out.push_str(&format!("Uploaded {} file(s) to \"{category}\".", resp.files.len()));
    out
}

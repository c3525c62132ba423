mod budget;
mod cli;
mod db;
mod error;
mod expediente;
mod fmt;
mod models;
mod session;
mod settings;
mod store;
mod tree_view;
mod tui;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Preview {
            file,
            category,
            convenio,
            json,
        } => cli::preview::run(&file, &category, convenio, json),
        Commands::Upload {
            files,
            category,
            convenio,
            json,
        } => cli::upload::run(&files, &category, convenio, json),
        Commands::Presupuesto {
            convenio,
            text,
            collapse,
        } => cli::presupuesto::run(convenio, text, &collapse),
        Commands::Resumen { convenio, json } => cli::resumen::run(convenio, json),
        Commands::Files { convenio } => cli::files::run(convenio),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

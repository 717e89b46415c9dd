//! Student Risk Service - Main Entry Point

use api::config::load_config;
use api::{init_logging, load_students, run_server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storage::LoadOutcome;
use tracing::info;

#[derive(Parser)]
#[command(name = "student-risk")]
#[command(about = "Student dropout risk prediction service", long_about = None)]
struct Cli {
    /// Config file path (defaults to config/student-risk.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prediction API
    Serve,
    /// Seed the database with enrolled students from the dataset
    LoadStudents {
        /// Delete existing students first
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    info!("=== Student Risk Service v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await?,
        Commands::LoadStudents { force } => match load_students(&config, force).await? {
            LoadOutcome::Skipped { existing } => {
                info!("{} students already stored, nothing loaded", existing)
            }
            LoadOutcome::Loaded { inserted, deleted } => {
                info!("Loaded {} students ({} replaced)", inserted, deleted)
            }
        },
    }

    Ok(())
}

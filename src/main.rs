use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use commands::OutputFmt;
use pulsefit::{SqliteStore, config::Config, db::open};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let fmt = if cli.json { OutputFmt::Json } else { OutputFmt::Pretty };

    let config_path = Config::default_path()?;
    let cfg = Config::load(&config_path)?;
    init_logging(cfg.log_filter());

    match cli.cmd {
        Commands::Session(cmd) => commands::session::handle(cmd, &open_store(&cfg).await?, &cfg, fmt).await?,
        Commands::Template(cmd) => commands::template::handle(cmd, &open_store(&cfg).await?, fmt).await?,
        Commands::Exercise(cmd) => commands::exercise::handle(cmd, fmt)?,
        Commands::Measure(cmd) => commands::measure::handle(cmd, &open_store(&cfg).await?, &cfg, fmt).await?,
        Commands::Meal(cmd) => commands::meal::handle(cmd, &open_store(&cfg).await?, &cfg, fmt).await?,
        Commands::Stats => commands::stats::handle(&open_store(&cfg).await?, fmt).await?,
        Commands::Calendar { year, month } => commands::calendar::handle(&open_store(&cfg).await?, year, month).await?,
        // Config edits must work even when the database cannot be opened.
        Commands::Config(cmd) => commands::config::handle(cmd, &config_path, cfg)?,
    }

    Ok(())
}

async fn open_store(cfg: &Config) -> Result<SqliteStore> {
    let db_path = cfg.db_path()?;
    let pool = open(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    Ok(SqliteStore::new(pool))
}

/// `RUST_LOG` wins over the `log` config key.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

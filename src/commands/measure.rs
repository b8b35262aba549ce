use anyhow::Result;
use chrono::{Local, Utc};
use colored::Colorize;
use pulsefit::{
    Collection, FitError, Measurement, SqliteStore,
    config::Config,
    notify::NotificationSink,
    stats::recent,
    storage::{append, load},
    utils::{coerce_f64, coerce_positive},
};

use super::{OutputFmt, announcer, emit};
use crate::cli::MeasureCmd;

pub async fn handle(cmd: MeasureCmd, store: &SqliteStore, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    match cmd {
        MeasureCmd::Add { weight, body_fat } => {
            let entry = match Measurement::new(Utc::now(), coerce_f64(&weight), coerce_positive(body_fat.as_deref())) {
                Ok(m) => m,
                Err(e @ FitError::InvalidEntry(_)) => {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            append(store, Collection::Measurements, &entry).await?;
            announcer(cfg).announce("Measurement saved");
        }

        MeasureCmd::List { limit } => {
            let all: Vec<Measurement> = load(store, Collection::Measurements).await?;
            let shown: Vec<&Measurement> = recent(&all, limit).collect();

            emit(fmt, &shown, || {
                if shown.is_empty() {
                    println!("{}", "  (no measurements yet)".dimmed());
                    return;
                }

                println!("{}", "Measurements:".cyan().bold());
                for m in &shown {
                    let fat = m
                        .body_fat
                        .map(|bf| format!(" | {bf:.1}% fat"))
                        .unwrap_or_default();
                    println!(
                        "  {} {}{}",
                        m.date.with_timezone(&Local).format("%Y-%m-%d").to_string().green(),
                        format!("{:.1} kg", m.weight).bold(),
                        fat.dimmed()
                    );
                }
            })?;
        }
    }

    Ok(())
}

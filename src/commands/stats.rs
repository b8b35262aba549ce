use anyhow::Result;
use colored::Colorize;
use pulsefit::{
    Collection, Measurement, SqliteStore, WorkoutHistoryRecord,
    stats::{latest_measurement, motivation, streak, totals},
    storage::load,
};
use serde::Serialize;

use super::{OutputFmt, emit};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsJson<'a> {
    total_workouts: usize,
    streak: u32,
    /// Rounded to whole kilograms.
    total_volume: i64,
    latest_measurement: Option<&'a Measurement>,
    motivation: &'static str,
}

pub async fn handle(store: &SqliteStore, fmt: OutputFmt) -> Result<()> {
    let history: Vec<WorkoutHistoryRecord> = load(store, Collection::WorkoutHistory).await?;
    let measurements: Vec<Measurement> = load(store, Collection::Measurements).await?;

    let t = totals(&history);
    let out = StatsJson {
        total_workouts: t.count,
        streak: streak(&history),
        total_volume: t.total_volume.round() as i64,
        latest_measurement: latest_measurement(&measurements),
        motivation: motivation(),
    };

    emit(fmt, &out, || {
        println!("{}", out.motivation.magenta().italic());
        println!();
        println!("{:<16} {}", "Workouts".cyan().bold(), out.total_workouts);
        println!(
            "{:<16} {} {}",
            "Streak".cyan().bold(),
            out.streak,
            if out.streak == 1 { "day" } else { "days" }
        );
        println!("{:<16} {} kg", "Volume lifted".cyan().bold(), out.total_volume);

        match out.latest_measurement {
            Some(m) => {
                let fat = m.body_fat.map(|bf| format!(", {bf:.1}% fat")).unwrap_or_default();
                println!(
                    "{:<16} {:.1} kg{} {}",
                    "Body weight".cyan().bold(),
                    m.weight,
                    fat,
                    format!("({})", m.date.format("%Y-%m-%d")).dimmed()
                );
            }
            None => println!("{:<16} {}", "Body weight".cyan().bold(), "–".dimmed()),
        }
    })?;

    Ok(())
}

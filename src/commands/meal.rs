use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use pulsefit::{
    Collection, FitError, MealEntry, SqliteStore,
    config::Config,
    notify::NotificationSink,
    stats::{MacroTotals, daily_meal_totals},
    storage::{append, load},
    utils::coerce_u32,
};
use serde::Serialize;

use super::{OutputFmt, announcer, emit};
use crate::cli::MealCmd;

#[derive(Serialize)]
struct TodayJson<'a> {
    totals: MacroTotals,
    meals: Vec<&'a MealEntry>,
}

fn grams(raw: Option<&str>) -> u32 {
    raw.map(coerce_u32).unwrap_or(0)
}

pub async fn handle(cmd: MealCmd, store: &SqliteStore, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    let today = Local::now().date_naive();

    match cmd {
        MealCmd::Add {
            name,
            calories,
            protein,
            carbs,
            fats,
        } => {
            let entry = MealEntry::new(
                today,
                &name,
                coerce_u32(&calories),
                grams(protein.as_deref()),
                grams(carbs.as_deref()),
                grams(fats.as_deref()),
            );
            let entry = match entry {
                Ok(m) => m,
                Err(e @ FitError::InvalidEntry(_)) => {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            append(store, Collection::Meals, &entry).await?;
            announcer(cfg).announce("Meal logged");
        }

        MealCmd::Today => {
            let all: Vec<MealEntry> = load(store, Collection::Meals).await?;
            let totals = daily_meal_totals(&all, today);
            let meals: Vec<&MealEntry> = all.iter().rev().filter(|m| m.date == today).collect();
            let out = TodayJson { totals, meals };

            emit(fmt, &out, || {
                println!(
                    "{} {} kcal | P {}g | C {}g | F {}g",
                    "Today:".cyan().bold(),
                    out.totals.calories.to_string().bold(),
                    out.totals.protein,
                    out.totals.carbs,
                    out.totals.fats
                );

                if out.meals.is_empty() {
                    println!("{}", "  (nothing logged today)".dimmed());
                }
                for m in &out.meals {
                    println!(
                        "  • {} {} {}",
                        m.name.bold(),
                        format!("{} kcal", m.calories).green(),
                        format!("P {}g C {}g F {}g", m.protein, m.carbs, m.fats).dimmed()
                    );
                }
            })?;
        }
    }

    Ok(())
}

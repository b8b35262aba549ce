use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use colored::Colorize;
use pulsefit::{Collection, SqliteStore, WorkoutHistoryRecord, storage::load, utils::format_minutes};

/// First and last day of the month, or `None` when out of range.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Workouts of the month grouped by local calendar day.
fn by_day(
    history: &[WorkoutHistoryRecord],
    first: NaiveDate,
    last: NaiveDate,
) -> BTreeMap<u32, Vec<&WorkoutHistoryRecord>> {
    let mut days: BTreeMap<u32, Vec<&WorkoutHistoryRecord>> = BTreeMap::new();
    for r in history {
        let day = r.date.with_timezone(&Local).date_naive();
        if (first..=last).contains(&day) {
            days.entry(day.day()).or_default().push(r);
        }
    }
    days
}

pub async fn handle(store: &SqliteStore, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let now = Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    let Some((first_day, last_day)) = month_bounds(year, month) else {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    };

    let history: Vec<WorkoutHistoryRecord> = load(store, Collection::WorkoutHistory).await?;
    let days = by_day(&history, first_day, last_day);

    println!("\n{}", first_day.format("%B %Y").to_string().bold().cyan());
    println!("{}", "Su Mo Tu We Th Fr Sa".dimmed());

    // 0 = Sunday
    let first_weekday = first_day.weekday().num_days_from_sunday() as usize;
    print!("{}", "   ".repeat(first_weekday));

    for day in 1..=last_day.day() {
        if days.contains_key(&day) {
            print!("{} ", format!("{:2}", day).green().bold());
        } else {
            print!("{:2} ", day);
        }

        if (first_weekday + day as usize) % 7 == 0 {
            println!();
        }
    }
    println!("\n");

    if !days.is_empty() {
        println!("{}", "Workouts:".bold().cyan());
        for r in days.values().flatten() {
            println!(
                "  {} | {} ({}) | {:.0} kg",
                r.date.with_timezone(&Local).format("%a %b %d %H:%M").to_string().green(),
                r.name.bold(),
                format_minutes(r.duration),
                r.total_volume
            );
        }
    }

    Ok(())
}

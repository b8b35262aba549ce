//! Summaries derived from stored history. Nothing here is persisted.

use std::collections::HashSet;

use chrono::{Local, NaiveDate, TimeZone};
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::models::{MealEntry, Measurement, WorkoutHistoryRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub count: usize,
    pub total_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MacroTotals {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

/// Consecutive days with a workout, counting back from today in local time.
pub fn streak(history: &[WorkoutHistoryRecord]) -> u32 {
    streak_on(history, Local::now().date_naive(), &Local)
}

/// Consecutive calendar days in `tz` ending at `today` with at least one
/// record. Several records on one day count once; the first gap stops it.
pub fn streak_on<Tz: TimeZone>(history: &[WorkoutHistoryRecord], today: NaiveDate, tz: &Tz) -> u32 {
    let days: HashSet<NaiveDate> = history
        .iter()
        .map(|r| r.date.with_timezone(tz).date_naive())
        .collect();

    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

pub fn totals(history: &[WorkoutHistoryRecord]) -> Totals {
    Totals {
        count: history.len(),
        total_volume: history.iter().map(|r| r.total_volume).sum(),
    }
}

/// Sums saturate at `u32::MAX`; coerced input can already sit there.
pub fn daily_meal_totals(meals: &[MealEntry], day: NaiveDate) -> MacroTotals {
    meals
        .iter()
        .filter(|m| m.date == day)
        .fold(MacroTotals::default(), |acc, m| MacroTotals {
            calories: acc.calories.saturating_add(m.calories),
            protein: acc.protein.saturating_add(m.protein),
            carbs: acc.carbs.saturating_add(m.carbs),
            fats: acc.fats.saturating_add(m.fats),
        })
}

/// Last `n` items, newest first.
pub fn recent<T>(items: &[T], n: usize) -> impl Iterator<Item = &T> {
    items.iter().rev().take(n)
}

pub fn latest_measurement(measurements: &[Measurement]) -> Option<&Measurement> {
    measurements.iter().max_by_key(|m| m.date)
}

const MOTIVATION: [&str; 8] = [
    "Ready to crush your goals today?",
    "Your only limit is you!",
    "Make today count!",
    "Stronger than yesterday!",
    "Push yourself, no one else will!",
    "Success starts with self-discipline!",
    "Train insane or remain the same!",
    "The pain you feel today is the strength you feel tomorrow!",
];

pub fn motivation() -> &'static str {
    MOTIVATION
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MOTIVATION[0])
}

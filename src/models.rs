use std::fmt::Display;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::types::{MuscleGroup, best_exercise_suggestion};
use crate::utils::sanitize_f64;

pub const DEFAULT_REST_SECS: u32 = 60;

fn default_rest() -> u32 {
    DEFAULT_REST_SECS
}

/// One exercise within a template: what to do and how long to rest between sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePlan {
    pub muscle: MuscleGroup,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Rest between sets, in seconds.
    #[serde(default = "default_rest")]
    pub rest: u32,
}

impl ExercisePlan {
    /// Validates raw builder input. `name` must come from `muscle`'s catalog;
    /// sets and reps are required and positive; a missing or non-positive
    /// rest falls back to [`DEFAULT_REST_SECS`].
    pub fn new(muscle: MuscleGroup, name: &str, sets: i64, reps: i64, rest: Option<i64>) -> Result<Self> {
        let canonical = muscle.find_exercise(name).ok_or_else(|| {
            let hint = best_exercise_suggestion(muscle, name)
                .map(|s| format!(" -- did you mean `{s}`?"))
                .unwrap_or_default();
            FitError::InvalidTemplate(format!("`{}` is not a {muscle} exercise{hint}", name.trim()))
        })?;

        let sets = positive(sets)
            .ok_or_else(|| FitError::InvalidTemplate(format!("`{canonical}` needs at least one set")))?;
        let reps = positive(reps)
            .ok_or_else(|| FitError::InvalidTemplate(format!("`{canonical}` needs at least one rep")))?;
        let rest = rest.and_then(positive).unwrap_or(DEFAULT_REST_SECS);

        Ok(Self {
            muscle,
            name: canonical.to_string(),
            sets,
            reps,
            rest,
        })
    }
}

fn positive(v: i64) -> Option<u32> {
    u32::try_from(v).ok().filter(|v| *v > 0)
}

/// A saved, reusable workout definition. Never edited after it is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    /// Creation timestamp in milliseconds.
    pub id: i64,
    pub name: String,
    pub exercises: Vec<ExercisePlan>,
}

impl WorkoutTemplate {
    pub fn new(name: &str, exercises: Vec<ExercisePlan>) -> Result<Self> {
        let template = Self {
            id: Utc::now().timestamp_millis(),
            name: name.trim().to_string(),
            exercises,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FitError::InvalidTemplate("workout name is required".into()));
        }
        if self.exercises.is_empty() {
            return Err(FitError::InvalidTemplate(format!(
                "`{}` must contain at least one exercise",
                self.name
            )));
        }
        if let Some(bad) = self.exercises.iter().find(|e| e.sets == 0) {
            return Err(FitError::InvalidTemplate(format!("`{}` has no sets", bad.name)));
        }
        Ok(())
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets as usize).sum()
    }
}

/// Identifies one planned set: (exercise index, set index), both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SetId {
    pub exercise: usize,
    pub set: usize,
}

impl SetId {
    pub fn new(exercise: usize, set: usize) -> Self {
        Self { exercise, set }
    }
}

impl Display for SetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.exercise, self.set)
    }
}

/// Weight and reps recorded when a set is completed. Fixed once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoggedSet {
    pub weight: f64,
    pub reps: u32,
}

impl LoggedSet {
    /// Negative or non-finite weights and negative reps are logged as 0.
    pub fn new(weight: f64, reps: i64) -> Self {
        Self {
            weight: sanitize_f64(weight),
            reps: u32::try_from(reps.max(0)).unwrap_or(u32::MAX),
        }
    }

    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

/// Summary persisted once per finished workout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkoutHistoryRecord {
    pub name: String,
    pub date: DateTime<Utc>,
    /// Whole minutes, rounded down.
    pub duration: i64,
    #[serde(alias = "totalWeight")]
    pub total_volume: f64,
    /// Number of exercises in the template.
    pub exercises: usize,
}

/// Body measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub date: DateTime<Utc>,
    pub weight: f64,
    #[serde(default)]
    pub body_fat: Option<f64>,
}

impl Measurement {
    pub fn new(date: DateTime<Utc>, weight: f64, body_fat: Option<f64>) -> Result<Self> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(FitError::InvalidEntry("weight is required".into()));
        }

        Ok(Self {
            date,
            weight,
            body_fat: body_fat.filter(|bf| bf.is_finite() && *bf > 0.0),
        })
    }
}

/// A logged meal. Daily totals are derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub date: NaiveDate,
    pub name: String,
    pub calories: u32,
    #[serde(default)]
    pub protein: u32,
    #[serde(default)]
    pub carbs: u32,
    #[serde(default)]
    pub fats: u32,
}

impl MealEntry {
    pub fn new(date: NaiveDate, name: &str, calories: u32, protein: u32, carbs: u32, fats: u32) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || calories == 0 {
            return Err(FitError::InvalidEntry("meal name and calories are required".into()));
        }

        Ok(Self {
            date,
            name: name.to_string(),
            calories,
            protein,
            carbs,
            fats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_uses_catalog_spelling_and_default_rest() {
        let plan = ExercisePlan::new(MuscleGroup::Chest, "barbell bench press", 3, 10, None).unwrap();
        assert_eq!(plan.name, "Barbell Bench Press");
        assert_eq!(plan.rest, DEFAULT_REST_SECS);

        let plan = ExercisePlan::new(MuscleGroup::Chest, "Push-Ups", 3, 10, Some(0)).unwrap();
        assert_eq!(plan.rest, DEFAULT_REST_SECS);
    }

    #[test]
    fn plan_rejects_exercise_from_other_group() {
        let err = ExercisePlan::new(MuscleGroup::Legs, "Barbell Curl", 3, 10, None).unwrap_err();
        assert!(matches!(err, FitError::InvalidTemplate(_)));
    }

    #[test]
    fn plan_requires_sets_and_reps() {
        assert!(ExercisePlan::new(MuscleGroup::Core, "Plank", 0, 10, None).is_err());
        assert!(ExercisePlan::new(MuscleGroup::Core, "Plank", 3, -1, None).is_err());
    }

    #[test]
    fn template_requires_name_and_exercises() {
        let plan = ExercisePlan::new(MuscleGroup::Core, "Plank", 3, 1, Some(30)).unwrap();
        assert!(matches!(
            WorkoutTemplate::new("  ", vec![plan.clone()]),
            Err(FitError::InvalidTemplate(_))
        ));
        assert!(matches!(WorkoutTemplate::new("Abs", vec![]), Err(FitError::InvalidTemplate(_))));

        let t = WorkoutTemplate::new(" Abs ", vec![plan]).unwrap();
        assert_eq!(t.name, "Abs");
        assert_eq!(t.total_sets(), 3);
    }

    #[test]
    fn logged_set_clamps_bad_values() {
        assert_eq!(LoggedSet::new(-5.0, 10), LoggedSet { weight: 0.0, reps: 10 });
        assert_eq!(LoggedSet::new(f64::NAN, -2), LoggedSet::default());
        assert_eq!(LoggedSet::new(50.0, 8).volume(), 400.0);
    }

    #[test]
    fn history_record_reads_legacy_total_weight() {
        let rec: WorkoutHistoryRecord =
            serde_json::from_str(r#"{"name":"Legs","date":"2024-03-01T10:00:00.000Z","duration":42,"totalWeight":1200,"exercises":4}"#)
                .unwrap();
        assert_eq!(rec.total_volume, 1200.0);
        assert_eq!(rec.duration, 42);

        let empty: WorkoutHistoryRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.total_volume, 0.0);
    }

    #[test]
    fn measurement_requires_weight() {
        let now = Utc::now();
        assert!(Measurement::new(now, 0.0, None).is_err());
        let m = Measurement::new(now, 80.5, Some(-1.0)).unwrap();
        assert_eq!(m.body_fat, None);
    }

    #[test]
    fn meal_requires_name_and_calories() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(MealEntry::new(day, "", 500, 0, 0, 0).is_err());
        assert!(MealEntry::new(day, "Oats", 0, 0, 0, 0).is_err());
        assert_eq!(MealEntry::new(day, "Oats", 350, 12, 60, 6).unwrap().name, "Oats");
    }
}

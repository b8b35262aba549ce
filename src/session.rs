//! In-progress workout state.
//!
//! A [`WorkoutSession`] is created from a template, mutated only through
//! [`WorkoutSession::complete_set`], and consumed by [`WorkoutSession::finish`],
//! which turns it into the history record that gets persisted.
//!
//! ```text
//! start ──> Active ──complete_set*──> finish ──> WorkoutHistoryRecord
//! ```
//!
//! Within a session each set only moves `Pending -> Completed`. The clock is
//! passed in so the same code runs under tests and the live tracker.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{FitError, Result};
use crate::models::{LoggedSet, SetId, WorkoutHistoryRecord, WorkoutTemplate};

/// What the workout should do after a set is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextStep {
    /// More sets remain for this exercise.
    Rest { seconds: u32 },
    /// Last set of an exercise that is not the final one.
    NextExercise { finished: String },
    /// Last set of the final exercise.
    WorkoutComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetCompletion {
    pub set: SetId,
    pub logged: LoggedSet,
    pub next: NextStep,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutSession {
    template: WorkoutTemplate,
    started_at: DateTime<Utc>,
    completed: BTreeMap<SetId, LoggedSet>,
    total_volume: f64,
}

impl WorkoutSession {
    pub fn start(template: WorkoutTemplate, started_at: DateTime<Utc>) -> Result<Self> {
        template.validate()?;

        Ok(Self {
            template,
            started_at,
            completed: BTreeMap::new(),
            total_volume: 0.0,
        })
    }

    pub fn template(&self) -> &WorkoutTemplate {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn is_completed(&self, id: SetId) -> bool {
        self.completed.contains_key(&id)
    }

    /// Values recorded for a completed set.
    pub fn logged(&self, id: SetId) -> Option<&LoggedSet> {
        self.completed.get(&id)
    }

    /// Records a set. Completing an already-completed set is a no-op and
    /// returns `Ok(None)`; the first logged values stand.
    pub fn complete_set(&mut self, id: SetId, logged: LoggedSet) -> Result<Option<SetCompletion>> {
        let exercise = self
            .template
            .exercises
            .get(id.exercise)
            .filter(|e| id.set < e.sets as usize)
            .ok_or(FitError::UnknownSet {
                exercise: id.exercise,
                set: id.set,
            })?;

        if self.completed.contains_key(&id) {
            return Ok(None);
        }

        let next = if id.set + 1 < exercise.sets as usize {
            NextStep::Rest {
                seconds: exercise.rest,
            }
        } else if id.exercise + 1 < self.template.exercises.len() {
            NextStep::NextExercise {
                finished: exercise.name.clone(),
            }
        } else {
            NextStep::WorkoutComplete
        };

        self.completed.insert(id, logged);
        self.total_volume += logged.volume();

        Ok(Some(SetCompletion { set: id, logged, next }))
    }

    /// Whole minutes since start, rounded down.
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes().max(0)
    }

    pub fn finish(self, ended_at: DateTime<Utc>) -> WorkoutHistoryRecord {
        WorkoutHistoryRecord {
            duration: self.duration_minutes(ended_at),
            name: self.template.name,
            date: ended_at,
            total_volume: self.total_volume,
            exercises: self.template.exercises.len(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ExercisePlan;
    use crate::types::MuscleGroup;
    use chrono::Duration;
    use proptest::prelude::*;

    pub(crate) fn plan(name: &str, sets: u32, reps: u32, rest: u32) -> ExercisePlan {
        ExercisePlan {
            muscle: MuscleGroup::Chest,
            name: name.to_string(),
            sets,
            reps,
            rest,
        }
    }

    pub(crate) fn push_day() -> WorkoutTemplate {
        WorkoutTemplate {
            id: 1,
            name: "Push Day".to_string(),
            exercises: vec![plan("Bench Press", 2, 10, 30)],
        }
    }

    fn two_exercises() -> WorkoutTemplate {
        WorkoutTemplate {
            id: 2,
            name: "Upper".to_string(),
            exercises: vec![plan("Bench Press", 2, 10, 45), plan("Cable Flyes", 1, 12, 60)],
        }
    }

    #[test]
    fn start_is_empty() {
        let session = WorkoutSession::start(push_day(), Utc::now()).unwrap();
        assert_eq!(session.completed_count(), 0);
        assert_eq!(session.total_volume(), 0.0);
    }

    #[test]
    fn start_rejects_empty_template() {
        let mut t = push_day();
        t.exercises.clear();
        assert!(matches!(
            WorkoutSession::start(t, Utc::now()),
            Err(FitError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn completion_is_idempotent() {
        let mut s = WorkoutSession::start(push_day(), Utc::now()).unwrap();
        let id = SetId::new(0, 0);

        assert!(s.complete_set(id, LoggedSet::new(50.0, 10)).unwrap().is_some());
        assert!(s.complete_set(id, LoggedSet::new(90.0, 10)).unwrap().is_none());

        assert_eq!(s.completed_count(), 1);
        assert_eq!(s.total_volume(), 500.0);
        assert_eq!(s.logged(id), Some(&LoggedSet::new(50.0, 10)));
    }

    #[test]
    fn unknown_sets_are_rejected() {
        let mut s = WorkoutSession::start(push_day(), Utc::now()).unwrap();
        assert!(matches!(
            s.complete_set(SetId::new(0, 2), LoggedSet::default()),
            Err(FitError::UnknownSet { exercise: 0, set: 2 })
        ));
        assert!(matches!(
            s.complete_set(SetId::new(1, 0), LoggedSet::default()),
            Err(FitError::UnknownSet { .. })
        ));
        assert_eq!(s.completed_count(), 0);
    }

    #[test]
    fn next_step_follows_position_in_plan() {
        let mut s = WorkoutSession::start(two_exercises(), Utc::now()).unwrap();

        let step = |s: &mut WorkoutSession, ex, set| {
            s.complete_set(SetId::new(ex, set), LoggedSet::new(20.0, 10))
                .unwrap()
                .unwrap()
                .next
        };

        assert_eq!(step(&mut s, 0, 0), NextStep::Rest { seconds: 45 });
        assert_eq!(
            step(&mut s, 0, 1),
            NextStep::NextExercise {
                finished: "Bench Press".into()
            }
        );
        assert_eq!(step(&mut s, 1, 0), NextStep::WorkoutComplete);
    }

    #[test]
    fn finish_rounds_duration_down() {
        let start = Utc::now();
        let mut s = WorkoutSession::start(push_day(), start).unwrap();
        s.complete_set(SetId::new(0, 0), LoggedSet::new(50.0, 10)).unwrap();
        s.complete_set(SetId::new(0, 1), LoggedSet::new(50.0, 8)).unwrap();

        let rec = s.finish(start + Duration::seconds(59));
        assert_eq!(rec.duration, 0);
        assert_eq!(rec.total_volume, 900.0);
        assert_eq!(rec.exercises, 1);
        assert_eq!(rec.name, "Push Day");

        let s = WorkoutSession::start(push_day(), start).unwrap();
        assert_eq!(s.finish(start + Duration::seconds(61 * 60 + 59)).duration, 61);
    }

    proptest! {
        #[test]
        fn volume_matches_distinct_completions(
            ops in prop::collection::vec((0usize..3, 0usize..4, 0.0f64..200.0, 0i64..20), 0..40)
        ) {
            let template = WorkoutTemplate {
                id: 3,
                name: "Grid".into(),
                exercises: vec![plan("A", 4, 10, 30), plan("B", 4, 10, 30), plan("C", 4, 10, 30)],
            };
            let mut s = WorkoutSession::start(template, Utc::now()).unwrap();
            let mut first: BTreeMap<SetId, LoggedSet> = BTreeMap::new();

            for (ex, set, w, r) in ops {
                let id = SetId::new(ex, set);
                let logged = LoggedSet::new(w, r);
                s.complete_set(id, logged).unwrap();
                first.entry(id).or_insert(logged);
            }

            let expected: f64 = first.values().map(|l| l.volume()).sum();
            prop_assert_eq!(s.completed_count(), first.len());
            prop_assert!((s.total_volume() - expected).abs() < 1e-6);
        }
    }
}

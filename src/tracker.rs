//! The live workout: one optional [`WorkoutSession`] plus its timers.
//!
//! ```text
//! Idle --start--> Active --end / deferred finish--> Idle
//! ```
//!
//! Only one workout may be active; a second `start` is a
//! [`FitError::Conflict`]. Timer events are fed back through
//! [`WorkoutTracker::handle_event`] by whoever owns the receiver.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::error::{FitError, Result};
use crate::models::{LoggedSet, SetId, WorkoutHistoryRecord, WorkoutTemplate};
use crate::notify::NotificationSink;
use crate::session::{NextStep, SetCompletion, WorkoutSession};
use crate::storage::{Collection, PersistentStore, append};
use crate::timer::{RestMilestone, TimerCoordinator, TimerEvent, TimerKind};
use crate::utils::format_clock;

/// Pause between the final set and saving, so the last announcement can finish.
pub const FINISH_DELAY: Duration = Duration::from_secs(2);

pub struct WorkoutTracker<S, N> {
    store: S,
    sink: N,
    timers: TimerCoordinator,
    active: Option<WorkoutSession>,
    elapsed: Duration,
    rest_remaining: Option<u32>,
}

impl<S: PersistentStore, N: NotificationSink> WorkoutTracker<S, N> {
    pub fn new(store: S, sink: N) -> (Self, UnboundedReceiver<TimerEvent>) {
        let (timers, events) = TimerCoordinator::new();
        let tracker = Self {
            store,
            sink,
            timers,
            active: None,
            elapsed: Duration::ZERO,
            rest_remaining: None,
        };
        (tracker, events)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Elapsed workout time as `MM:SS`, as of the last clock tick.
    pub fn clock(&self) -> String {
        format_clock(self.elapsed)
    }

    /// Seconds left on the running rest timer.
    pub fn rest_remaining(&self) -> Option<u32> {
        self.rest_remaining
    }

    pub fn start(&mut self, template: WorkoutTemplate) -> Result<&WorkoutSession> {
        if let Some(active) = &self.active {
            return Err(FitError::Conflict {
                active: active.name().to_string(),
            });
        }

        let session = WorkoutSession::start(template, Utc::now())?;
        info!(workout = %session.name(), sets = session.template().total_sets(), "workout started");
        self.sink
            .announce(&format!("Starting {}. Let's get it!", session.name()));

        self.elapsed = Duration::ZERO;
        self.rest_remaining = None;
        self.timers.start_elapsed();
        Ok(&*self.active.insert(session))
    }

    /// Records a set and reacts to where it sits in the plan. `Ok(None)` means
    /// the set had already been completed and nothing happened.
    pub fn complete_set(&mut self, set: SetId, logged: LoggedSet) -> Result<Option<SetCompletion>> {
        let session = self.active.as_mut().ok_or(FitError::NoActiveSession)?;
        let Some(done) = session.complete_set(set, logged)? else {
            debug!(%set, "set already completed");
            return Ok(None);
        };

        info!(%set, weight = logged.weight, reps = logged.reps, volume = session.total_volume(), "set completed");
        self.sink
            .announce(&format!("Set {} complete. Great job!", set.set + 1));

        match &done.next {
            NextStep::Rest { seconds } => {
                self.timers.start_rest(*seconds);
                self.rest_remaining = Some(*seconds);
                self.sink.announce(&format!("Rest for {seconds} seconds"));
            }
            NextStep::NextExercise { finished } => {
                self.sink
                    .announce(&format!("{finished} complete. Moving to next exercise."));
            }
            NextStep::WorkoutComplete => {
                self.sink.announce("Workout complete! Amazing work!");
                self.timers.schedule_finish(FINISH_DELAY);
            }
        }

        Ok(Some(done))
    }

    /// Cancels the rest countdown. Returns whether one was running.
    pub fn skip_rest(&mut self) -> bool {
        self.rest_remaining = None;
        self.timers.stop(TimerKind::Rest)
    }

    /// Saves the active workout to history and returns to idle. Returns
    /// `Ok(None)` when nothing is active, so repeated calls are harmless.
    /// If saving fails the workout stays active.
    pub async fn end(&mut self) -> Result<Option<WorkoutHistoryRecord>> {
        let Some(session) = &self.active else {
            return Ok(None);
        };

        let record = session.clone().finish(Utc::now());
        append(&self.store, Collection::WorkoutHistory, &record).await?;

        self.active = None;
        self.timers.stop_all();
        self.rest_remaining = None;

        info!(
            workout = %record.name,
            minutes = record.duration,
            volume = record.total_volume,
            "workout saved"
        );
        self.sink.announce("Workout saved. Great session!");
        Ok(Some(record))
    }

    /// Applies one timer event. Returns the saved record when the event was
    /// the deferred finish that ended the workout.
    pub async fn handle_event(&mut self, event: TimerEvent) -> Result<Option<WorkoutHistoryRecord>> {
        if !self.timers.accept(&event) {
            return Ok(None);
        }

        match event {
            TimerEvent::Elapsed { elapsed, .. } => {
                self.elapsed = elapsed;
                debug!(clock = %self.clock(), "tick");
            }
            TimerEvent::Rest {
                remaining,
                milestone,
                ..
            } => {
                self.rest_remaining = (remaining > 0).then_some(remaining);
                match milestone {
                    Some(RestMilestone::Countdown(n)) => self.sink.announce(&n.to_string()),
                    Some(RestMilestone::TimeUp) => self
                        .sink
                        .announce("Rest time over. Ready for the next set!"),
                    None => {}
                }
            }
            TimerEvent::Finish { .. } => return self.end().await,
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::tests::RecordingSink;
    use crate::session::tests::{plan, push_day};
    use crate::storage::{MemoryStore, load};

    type Tracker = WorkoutTracker<MemoryStore, RecordingSink>;

    fn tracker() -> (Tracker, UnboundedReceiver<TimerEvent>, RecordingSink) {
        let sink = RecordingSink::default();
        let (tracker, rx) = WorkoutTracker::new(MemoryStore::default(), sink.clone());
        (tracker, rx, sink)
    }

    /// Feeds events until the tracker reports the workout saved.
    async fn run_until_saved(t: &mut Tracker, rx: &mut UnboundedReceiver<TimerEvent>) -> WorkoutHistoryRecord {
        loop {
            let event = rx.recv().await.expect("timer channel closed");
            if let Some(record) = t.handle_event(event).await.unwrap() {
                return record;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn push_day_scenario() {
        let (mut t, mut rx, sink) = tracker();
        t.start(push_day()).unwrap();

        let first = t.complete_set(SetId::new(0, 0), LoggedSet::new(50.0, 10)).unwrap().unwrap();
        assert_eq!(first.next, NextStep::Rest { seconds: 30 });
        assert_eq!(t.rest_remaining(), Some(30));

        let last = t.complete_set(SetId::new(0, 1), LoggedSet::new(50.0, 8)).unwrap().unwrap();
        assert_eq!(last.next, NextStep::WorkoutComplete);
        assert!(t.is_active());

        let started = tokio::time::Instant::now();
        let record = run_until_saved(&mut t, &mut rx).await;
        assert_eq!(started.elapsed(), FINISH_DELAY);

        assert!(!t.is_active());
        assert_eq!(record.total_volume, 900.0);
        assert_eq!(record.exercises, 1);
        assert_eq!(record.duration, 0);

        let history: Vec<WorkoutHistoryRecord> = load(t.store(), Collection::WorkoutHistory).await.unwrap();
        assert_eq!(history, vec![record]);

        let messages = sink.messages();
        assert_eq!(messages.first().map(String::as_str), Some("Starting Push Day. Let's get it!"));
        assert!(messages.contains(&"Rest for 30 seconds".to_string()));
        assert!(messages.contains(&"Workout complete! Amazing work!".to_string()));
        assert_eq!(messages.last().map(String::as_str), Some("Workout saved. Great session!"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_a_conflict() {
        let (mut t, _rx, _sink) = tracker();
        t.start(push_day()).unwrap();

        let mut other = push_day();
        other.name = "Pull Day".into();
        assert!(matches!(t.start(other), Err(FitError::Conflict { active }) if active == "Push Day"));
        assert_eq!(t.session().unwrap().name(), "Push Day");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_template_leaves_tracker_idle() {
        let (mut t, _rx, sink) = tracker();
        let mut empty = push_day();
        empty.exercises.clear();

        assert!(matches!(t.start(empty), Err(FitError::InvalidTemplate(_))));
        assert!(!t.is_active());
        assert!(sink.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn end_twice_is_a_no_op() {
        let (mut t, _rx, _sink) = tracker();
        t.start(push_day()).unwrap();

        assert!(t.end().await.unwrap().is_some());
        assert!(t.end().await.unwrap().is_none());

        let history: Vec<WorkoutHistoryRecord> = load(t.store(), Collection::WorkoutHistory).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completing_while_idle_fails() {
        let (mut t, _rx, _sink) = tracker();
        assert!(matches!(
            t.complete_set(SetId::new(0, 0), LoggedSet::default()),
            Err(FitError::NoActiveSession)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_completion_is_silent() {
        let (mut t, _rx, sink) = tracker();
        t.start(push_day()).unwrap();
        t.complete_set(SetId::new(0, 0), LoggedSet::new(50.0, 10)).unwrap();
        let before = sink.messages().len();

        assert!(t.complete_set(SetId::new(0, 0), LoggedSet::new(70.0, 10)).unwrap().is_none());
        assert_eq!(sink.messages().len(), before);
        assert_eq!(t.session().unwrap().total_volume(), 500.0);
    }

    #[tokio::test(start_paused = true)]
    async fn rest_countdown_is_announced() {
        let (mut t, mut rx, sink) = tracker();
        let mut template = push_day();
        template.exercises = vec![plan("Bench Press", 2, 10, 5)];
        t.start(template).unwrap();
        t.complete_set(SetId::new(0, 0), LoggedSet::new(40.0, 10)).unwrap();

        while t.rest_remaining().is_some() {
            let event = rx.recv().await.unwrap();
            t.handle_event(event).await.unwrap();
        }

        let messages = sink.messages();
        let tail: Vec<&str> = messages
            .iter()
            .map(String::as_str)
            .filter(|m| !m.starts_with("Starting") && !m.starts_with("Set "))
            .collect();
        assert_eq!(
            tail,
            vec!["Rest for 5 seconds", "3", "2", "1", "Rest time over. Ready for the next set!"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clock_follows_elapsed_ticks() {
        let (mut t, mut rx, _sink) = tracker();
        t.start(push_day()).unwrap();
        assert_eq!(t.clock(), "00:00");

        tokio::time::sleep(Duration::from_millis(3500)).await;
        while let Ok(event) = rx.try_recv() {
            t.handle_event(event).await.unwrap();
        }
        assert_eq!(t.clock(), "00:03");
    }

    #[tokio::test(start_paused = true)]
    async fn new_rest_replaces_running_one() {
        let (mut t, mut rx, sink) = tracker();
        let mut template = push_day();
        template.exercises = vec![plan("Bench Press", 3, 10, 4), plan("Cable Flyes", 3, 10, 60)];
        t.start(template).unwrap();

        t.complete_set(SetId::new(0, 0), LoggedSet::new(40.0, 10)).unwrap();
        t.complete_set(SetId::new(1, 0), LoggedSet::new(10.0, 12)).unwrap();
        assert_eq!(t.rest_remaining(), Some(60));

        // Past the point where the 4 s timer would have announced "Rest time over".
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        while let Ok(event) = rx.try_recv() {
            t.handle_event(event).await.unwrap();
        }

        assert_eq!(t.rest_remaining(), Some(50));
        let messages = sink.messages();
        assert!(!messages.iter().any(|m| m == "3" || m.starts_with("Rest time over")));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_end_cancels_deferred_finish() {
        let (mut t, mut rx, _sink) = tracker();
        t.start(push_day()).unwrap();
        t.complete_set(SetId::new(0, 1), LoggedSet::new(50.0, 8)).unwrap();

        let record = t.end().await.unwrap().unwrap();
        assert_eq!(record.total_volume, 400.0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        while let Ok(event) = rx.try_recv() {
            assert!(t.handle_event(event).await.unwrap().is_none());
        }

        let history: Vec<WorkoutHistoryRecord> = load(t.store(), Collection::WorkoutHistory).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_rest_stops_countdown() {
        let (mut t, mut rx, sink) = tracker();
        t.start(push_day()).unwrap();
        t.complete_set(SetId::new(0, 0), LoggedSet::new(50.0, 10)).unwrap();

        assert!(t.skip_rest());
        assert!(!t.skip_rest());
        assert_eq!(t.rest_remaining(), None);

        tokio::time::sleep(Duration::from_secs(40)).await;
        while let Ok(event) = rx.try_recv() {
            t.handle_event(event).await.unwrap();
        }
        assert!(!sink.messages().iter().any(|m| m.starts_with("Rest time over")));
    }
}

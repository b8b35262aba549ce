//! Timer coordination for a running workout.
//!
//! Three independent slots, each backed by one tokio task at most:
//!
//! - **elapsed**: ticks every second with the wall-clock time since it started.
//! - **rest**: counts down once per second and stops itself at zero.
//! - **finish**: a one-shot delay used to end the workout after the last set.
//!
//! Timer tasks never touch workout state. They only send [`TimerEvent`]s to a
//! single consumer, which must pass every event through
//! [`TimerCoordinator::accept`] before acting on it. Each slot carries a
//! generation that is bumped whenever the slot is stopped or restarted, so
//! ticks that were already queued for a cancelled timer are rejected there.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Elapsed,
    Rest,
    Finish,
}

/// Named points of the rest countdown that get announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestMilestone {
    /// 3, 2 or 1 seconds left.
    Countdown(u32),
    TimeUp,
}

pub fn rest_milestone(remaining: u32) -> Option<RestMilestone> {
    match remaining {
        0 => Some(RestMilestone::TimeUp),
        1..=3 => Some(RestMilestone::Countdown(remaining)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Elapsed {
        generation: u64,
        elapsed: Duration,
    },
    Rest {
        generation: u64,
        remaining: u32,
        milestone: Option<RestMilestone>,
    },
    Finish {
        generation: u64,
    },
}

impl TimerEvent {
    pub fn kind(&self) -> TimerKind {
        match self {
            Self::Elapsed { .. } => TimerKind::Elapsed,
            Self::Rest { .. } => TimerKind::Rest,
            Self::Finish { .. } => TimerKind::Finish,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Elapsed { generation, .. }
            | Self::Rest { generation, .. }
            | Self::Finish { generation } => *generation,
        }
    }

    /// Last event a timer of this kind will ever send.
    fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Rest { remaining: 0, .. } | Self::Finish { .. }
        )
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Slot {
    /// Aborts the task and invalidates its generation. No-op when idle.
    fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    fn arm(&mut self, spawn: impl FnOnce(u64) -> JoinHandle<()>) {
        self.stop();
        self.generation += 1;
        self.handle = Some(spawn(self.generation));
    }
}

pub struct TimerCoordinator {
    tx: UnboundedSender<TimerEvent>,
    elapsed: Slot,
    rest: Slot,
    finish: Slot,
}

impl TimerCoordinator {
    pub fn new() -> (Self, UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            tx,
            elapsed: Slot::default(),
            rest: Slot::default(),
            finish: Slot::default(),
        };
        (coordinator, rx)
    }

    fn slot(&self, kind: TimerKind) -> &Slot {
        match kind {
            TimerKind::Elapsed => &self.elapsed,
            TimerKind::Rest => &self.rest,
            TimerKind::Finish => &self.finish,
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Slot {
        match kind {
            TimerKind::Elapsed => &mut self.elapsed,
            TimerKind::Rest => &mut self.rest,
            TimerKind::Finish => &mut self.finish,
        }
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.slot(kind).handle.is_some()
    }

    /// Starts (or restarts) the elapsed clock from zero.
    pub fn start_elapsed(&mut self) {
        let tx = self.tx.clone();
        self.elapsed.arm(|generation| {
            tokio::spawn(async move {
                let origin = Instant::now();
                let mut ticker = interval_at(origin + TICK, TICK);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    ticker.tick().await;
                    let event = TimerEvent::Elapsed {
                        generation,
                        elapsed: origin.elapsed(),
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            })
        });
    }

    /// Starts a rest countdown, replacing any rest timer already running.
    pub fn start_rest(&mut self, seconds: u32) {
        let tx = self.tx.clone();
        self.rest.arm(|generation| {
            tokio::spawn(async move {
                let mut remaining = seconds;
                let mut ticker = interval_at(Instant::now() + TICK, TICK);

                loop {
                    ticker.tick().await;
                    remaining = remaining.saturating_sub(1);
                    let event = TimerEvent::Rest {
                        generation,
                        remaining,
                        milestone: rest_milestone(remaining),
                    };
                    if tx.send(event).is_err() || remaining == 0 {
                        break;
                    }
                }
            })
        });
        debug!(seconds, generation = self.rest.generation, "rest timer started");
    }

    /// Sends a single [`TimerEvent::Finish`] after `delay`.
    pub fn schedule_finish(&mut self, delay: Duration) {
        let tx = self.tx.clone();
        self.finish.arm(|generation| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(TimerEvent::Finish { generation });
            })
        });
    }

    /// Returns whether a timer was actually running.
    pub fn stop(&mut self, kind: TimerKind) -> bool {
        self.slot_mut(kind).stop()
    }

    pub fn stop_all(&mut self) {
        for kind in [TimerKind::Elapsed, TimerKind::Rest, TimerKind::Finish] {
            self.stop(kind);
        }
    }

    /// Decides whether `event` comes from a live timer. Events from stopped or
    /// replaced timers return `false` and must be ignored. A timer's final
    /// event retires its slot.
    pub fn accept(&mut self, event: &TimerEvent) -> bool {
        let slot = self.slot_mut(event.kind());
        if slot.handle.is_none() || slot.generation != event.generation() {
            debug!(kind = ?event.kind(), generation = event.generation(), "dropping stale timer event");
            return false;
        }

        if event.is_final() {
            slot.stop();
        }
        true
    }
}

impl Drop for TimerCoordinator {
    fn drop(&mut self) {
        self.stop_all();
    }
}

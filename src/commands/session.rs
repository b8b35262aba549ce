use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use pulsefit::{
    Collection, FitError, LoggedSet, PersistentStore, SetId, SqliteStore, WorkoutHistoryRecord, WorkoutSession,
    WorkoutTemplate, WorkoutTracker,
    config::Config,
    notify::NotificationSink,
    stats::recent,
    storage::load,
    utils::{coerce_f64, coerce_u32, format_minutes},
};
use std::io::BufRead;
use tokio::sync::mpsc;

use super::{OutputFmt, announcer, emit, find_template};
use crate::cli::SessionCmd;

pub async fn handle(cmd: SessionCmd, store: &SqliteStore, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    match cmd {
        SessionCmd::Start { template } => start(store, cfg, template.as_deref()).await,
        SessionCmd::History { limit } => history(store, limit, fmt).await,
    }
}

/// One line typed during a live workout. Indices are zero-based here.
#[derive(Debug, PartialEq)]
enum Action {
    Done {
        set: SetId,
        weight: Option<String>,
        reps: Option<String>,
    },
    Skip,
    Status,
    End,
    Help,
}

const HELP: &str = "done <ex> <set> [weight] [reps] · skip · status · end · help";

/// `Ok(None)` for a blank line.
fn parse_action(line: &str) -> Result<Option<Action>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "done" | "d" => {
            let mut index = |what: &str| -> Result<usize, String> {
                let raw = words.next().ok_or_else(|| format!("missing {what} number -- {HELP}"))?;
                raw.parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .ok_or_else(|| format!("{what} must be a number ≥ 1, got `{raw}`"))
            };
            let exercise = index("exercise")?;
            let set = index("set")?;

            Action::Done {
                set: SetId::new(exercise, set),
                weight: words.next().map(str::to_string),
                reps: words.next().map(str::to_string),
            }
        }
        "skip" => Action::Skip,
        "status" | "s" => Action::Status,
        "end" | "quit" | "q" => Action::End,
        "help" | "h" | "?" => Action::Help,
        other => return Err(format!("unknown command `{other}` -- {HELP}")),
    };

    Ok(Some(action))
}

async fn start(store: &SqliteStore, cfg: &Config, key: Option<&str>) -> Result<()> {
    let templates: Vec<WorkoutTemplate> = load(store, Collection::Workouts).await?;

    let found = match key {
        Some(k) => find_template(&templates, k),
        None => templates.first().map(|t| (0, t)),
    };
    let Some((_, template)) = found else {
        match key {
            Some(k) => println!("{} no template `{}`", "error:".red().bold(), k),
            None => println!(
                "{} no templates yet -- create one with `template add` or `template import`",
                "error:".red().bold()
            ),
        }
        return Ok(());
    };

    let (mut tracker, mut events) = WorkoutTracker::new(store.clone(), announcer(cfg));
    match tracker.start(template.clone()) {
        Ok(session) => print_plan(session),
        Err(e @ FitError::InvalidTemplate(_)) => {
            println!("{} {}", "error:".red().bold(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }
    println!("{}", HELP.dimmed());

    let mut input = stdin_lines();
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Some(record) = tracker.handle_event(event).await? {
                    print_summary(&record);
                    break;
                }
            }
            line = input.recv() => {
                let action = match line {
                    // Input closed: treat as `end`.
                    None => Action::End,
                    Some(line) => match parse_action(&line.context("Failed to read from stdin")?) {
                        Ok(Some(action)) => action,
                        Ok(None) => continue,
                        Err(msg) => {
                            println!("{} {}", "error:".red().bold(), msg);
                            continue;
                        }
                    },
                };

                if let Some(record) = apply(&mut tracker, action).await? {
                    print_summary(&record);
                    break;
                }
                if !tracker.is_active() {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Reads stdin on its own thread. A pending tokio stdin read would hold up
/// runtime shutdown when the workout ends on a timer.
fn stdin_lines() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn apply<S, N>(tracker: &mut WorkoutTracker<S, N>, action: Action) -> Result<Option<WorkoutHistoryRecord>>
where
    S: PersistentStore,
    N: NotificationSink,
{
    match action {
        Action::Done { set, weight, reps } => {
            let Some(session) = tracker.session() else {
                println!("{} no active workout", "error:".red().bold());
                return Ok(None);
            };

            // Reps default to the plan's target, weight to 0.
            let target_reps = session
                .template()
                .exercises
                .get(set.exercise)
                .map(|e| e.reps)
                .unwrap_or(0);
            let logged = LoggedSet::new(
                weight.as_deref().map(coerce_f64).unwrap_or(0.0),
                reps.as_deref().map(coerce_u32).unwrap_or(target_reps) as i64,
            );

            match tracker.complete_set(set, logged) {
                Ok(Some(done)) => {
                    let volume = tracker.session().map(|s| s.total_volume()).unwrap_or(0.0);
                    println!(
                        "{} set {}-{}: {}kg × {} {}",
                        "ok:".green().bold(),
                        set.exercise + 1,
                        set.set + 1,
                        done.logged.weight,
                        done.logged.reps,
                        format!("(total {volume:.0} kg)").dimmed()
                    );
                }
                Ok(None) => println!(
                    "{} set {}-{} is already done",
                    "info:".blue().bold(),
                    set.exercise + 1,
                    set.set + 1
                ),
                Err(FitError::UnknownSet { .. }) => println!(
                    "{} exercise {} has no set {}",
                    "error:".red().bold(),
                    set.exercise + 1,
                    set.set + 1
                ),
                Err(e) => return Err(e.into()),
            }
        }

        Action::Skip => {
            if tracker.skip_rest() {
                println!("{} rest skipped", "info:".blue().bold());
            } else {
                println!("{} no rest timer running", "info:".blue().bold());
            }
        }

        Action::Status => {
            if let Some(session) = tracker.session() {
                print_status(session, &tracker.clock(), tracker.rest_remaining());
            }
        }

        Action::End => return Ok(tracker.end().await?),

        Action::Help => println!("{}", HELP),
    }

    Ok(None)
}

fn print_plan(session: &WorkoutSession) {
    println!("{} {}", "Workout:".cyan().bold(), session.name().bold());
    println!("{}", "Exercises:".cyan().bold());
    for (i, ex) in session.template().exercises.iter().enumerate() {
        println!(
            "{} • {} – {} sets × {} reps, rest {}s",
            format!("{}", i + 1).yellow(),
            ex.name.bold(),
            ex.sets,
            ex.reps,
            ex.rest
        );
    }
}

fn print_status(session: &WorkoutSession, clock: &str, rest: Option<u32>) {
    let total = session.template().total_sets();
    println!(
        "{} {} | {}/{} sets | {:.0} kg",
        "⏱".cyan(),
        clock.bold(),
        session.completed_count(),
        total,
        session.total_volume()
    );
    if let Some(left) = rest {
        println!("  {} {}s", "rest:".yellow().bold(), left);
    }

    for (ex_idx, ex) in session.template().exercises.iter().enumerate() {
        let marks: String = (0..ex.sets as usize)
            .map(|set_idx| {
                match session.logged(SetId::new(ex_idx, set_idx)) {
                    Some(l) => format!(" {}", format!("{}×{}", l.weight, l.reps).green()),
                    None => format!(" {}", "·".dimmed()),
                }
            })
            .collect();
        println!("{} • {}{}", format!("{}", ex_idx + 1).yellow(), ex.name, marks);
    }
}

fn print_summary(record: &WorkoutHistoryRecord) {
    println!(
        "\n{} {} – {} | {:.0} kg lifted | {} exercises",
        "saved:".green().bold(),
        record.name.bold(),
        format_minutes(record.duration),
        record.total_volume,
        record.exercises
    );
}

async fn history(store: &SqliteStore, limit: usize, fmt: OutputFmt) -> Result<()> {
    let records: Vec<WorkoutHistoryRecord> = load(store, Collection::WorkoutHistory).await?;
    let shown: Vec<&WorkoutHistoryRecord> = recent(&records, limit).collect();

    emit(fmt, &shown, || {
        if shown.is_empty() {
            println!("{}", "  (no workouts yet)".dimmed());
            return;
        }

        println!("{}", "History:".cyan().bold());
        for r in &shown {
            println!(
                "  {} {} | {} | {:.0} kg lifted",
                r.date.with_timezone(&Local).format("%Y-%m-%d").to_string().green(),
                r.name.bold(),
                format_minutes(r.duration),
                r.total_volume
            );
        }
    })
}

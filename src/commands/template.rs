use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use colored::Colorize;
use itertools::Itertools;
use pulsefit::{
    Collection, ExercisePlan, FitError, MuscleGroup, SqliteStore, WorkoutTemplate,
    storage::{append, load, retain},
    types::{ALLOWED_MUSCLES, canonical_muscle, groups_for_exercise},
};
use serde::Deserialize;

use super::{OutputFmt, emit, find_template, print_columns};
use crate::cli::TemplateCmd;

/// On-disk form accepted by `template import`.
#[derive(Debug, Deserialize)]
struct TemplateToml {
    name: String,
    #[serde(default)]
    exercise: Vec<ExerciseToml>,
}

#[derive(Debug, Deserialize)]
struct ExerciseToml {
    /// Optional when the exercise sits under exactly one group.
    muscle: Option<String>,
    name: String,
    sets: i64,
    reps: i64,
    rest: Option<i64>,
}

pub async fn handle(cmd: TemplateCmd, store: &SqliteStore, fmt: OutputFmt) -> Result<()> {
    match cmd {
        TemplateCmd::Add { name, exercises } => {
            let built = exercises
                .iter()
                .map(|raw| parse_exercise_arg(raw))
                .collect::<pulsefit::Result<Vec<_>>>()
                .and_then(|plans| WorkoutTemplate::new(&name, plans));

            match built {
                Ok(template) => save(store, template).await?,
                Err(e @ FitError::InvalidTemplate(_)) => {
                    println!("{} {}", "error:".red().bold(), e);
                    print_allowed_muscles();
                }
                Err(e) => return Err(e.into()),
            }
        }

        TemplateCmd::Import { files } => {
            if files.is_empty() {
                println!("{} no template file provided", "warning:".yellow().bold());
            }

            let mut imported = 0;
            let mut skipped = 0;
            for f in files {
                match import_single_template(store, Path::new(&f)).await {
                    Ok(true) => imported += 1,
                    Ok(false) => skipped += 1,
                    Err(e) => {
                        if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
                            if io_err.kind() == std::io::ErrorKind::NotFound {
                                println!(
                                    "{} cannot open file `{}` – file not found",
                                    "error:".red().bold(),
                                    f
                                );
                                skipped += 1;
                                continue;
                            }
                        }
                        return Err(e);
                    }
                }
            }

            println!(
                "\n{} {} imported, {} skipped",
                "Summary:".cyan().bold(),
                imported,
                skipped
            );
        }

        TemplateCmd::List => {
            let templates: Vec<WorkoutTemplate> = load(store, Collection::Workouts).await?;

            emit(fmt, &templates, || {
                if templates.is_empty() {
                    println!("{}", "  (no templates found)".dimmed());
                    return;
                }

                println!("{}", "Templates:".cyan().bold());
                let idx_w = templates.len().to_string().len();
                let mut left = Vec::<String>::new();
                let mut right = Vec::<String>::new();

                for (i, t) in templates.iter().enumerate() {
                    let idx = format!("{:>width$}", i + 1, width = idx_w).yellow();
                    let names = t.exercises.iter().map(|e| e.name.as_str()).join(", ");
                    left.push(format!(" {} • {} {}", idx, t.name.bold(), format!("– {names}").dimmed()));
                    right.push(
                        format!("{} exercises, {} sets", t.exercises.len(), t.total_sets())
                            .dimmed()
                            .to_string(),
                    );
                }

                print_columns(left, right);
            })?;
        }

        TemplateCmd::Show { template } => {
            let templates: Vec<WorkoutTemplate> = load(store, Collection::Workouts).await?;
            let Some((idx, t)) = find_template(&templates, &template) else {
                println!("{} no template `{}`", "error:".red().bold(), template);
                return Ok(());
            };

            emit(fmt, t, || {
                println!("{} {}", format!("{}", idx + 1).yellow(), t.name.bold().cyan());
                for (i, ex) in t.exercises.iter().enumerate() {
                    let connector = if i + 1 == t.exercises.len() { "└─" } else { "├─" };
                    println!(
                        "  {} {} ({}) {}",
                        connector,
                        ex.name.bold(),
                        ex.muscle.to_string().yellow(),
                        format!("{} × {}, rest {}s", ex.sets, ex.reps, ex.rest).dimmed()
                    );
                }
            })?;
        }

        TemplateCmd::Delete { template } => {
            let templates: Vec<WorkoutTemplate> = load(store, Collection::Workouts).await?;
            let Some((_, t)) = find_template(&templates, &template) else {
                println!("{} no template `{}`", "error:".red().bold(), template);
                return Ok(());
            };

            let id = t.id;
            let removed = retain(store, Collection::Workouts, |doc| {
                doc.get("id").and_then(|v| v.as_i64()) != Some(id)
            })
            .await?;

            if removed > 0 {
                println!("{} deleted template `{}`", "ok:".green().bold(), t.name);
            } else {
                println!("{} template `{}` was not deleted", "info:".blue().bold(), t.name);
            }
        }
    }

    Ok(())
}

async fn save(store: &SqliteStore, mut template: WorkoutTemplate) -> Result<()> {
    // Ids are creation millis; keep them unique for fast back-to-back imports.
    let existing: Vec<WorkoutTemplate> = load(store, Collection::Workouts).await?;
    if let Some(max) = existing.iter().map(|t| t.id).max() {
        template.id = template.id.max(max + 1);
    }

    append(store, Collection::Workouts, &template).await?;
    println!(
        "{} Workout saved successfully: `{}` ({} exercises)",
        "ok:".green().bold(),
        template.name,
        template.exercises.len()
    );
    Ok(())
}

/// `Ok(false)` when the file parsed but held an unusable template.
async fn import_single_template(store: &SqliteStore, path: &Path) -> Result<bool> {
    let toml_str = tokio::fs::read_to_string(path).await?;
    let raw: TemplateToml =
        toml::from_str(&toml_str).with_context(|| format!("parsing `{}`", path.display()))?;

    let built = raw
        .exercise
        .iter()
        .map(|ex| {
            let muscle = resolve_muscle(ex.muscle.as_deref(), &ex.name)?;
            ExercisePlan::new(muscle, &ex.name, ex.sets, ex.reps, ex.rest)
        })
        .collect::<pulsefit::Result<Vec<_>>>()
        .and_then(|plans| WorkoutTemplate::new(&raw.name, plans));

    match built {
        Ok(template) => {
            save(store, template).await?;
            Ok(true)
        }
        Err(e @ FitError::InvalidTemplate(_)) => {
            println!(
                "{} cannot import `{}` – {}",
                "warning:".yellow().bold(),
                path.display(),
                e
            );
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Parses `MUSCLE:EXERCISE:SETSxREPS[:REST]`. The muscle may be left out
/// when the exercise belongs to a single group. A rest that is not a
/// number falls back to the default.
fn parse_exercise_arg(raw: &str) -> pulsefit::Result<ExercisePlan> {
    let invalid = |why: &str| FitError::InvalidTemplate(format!("`{}`: {why}", raw.trim()));

    let fields: Vec<&str> = raw.split(':').map(str::trim).collect();
    let (muscle, rest_fields) = match fields.first() {
        Some(first) if canonical_muscle(first).is_some() => (Some(*first), &fields[1..]),
        _ => (None, &fields[..]),
    };

    let (name, volume, rest) = match rest_fields {
        [name, volume] => (*name, *volume, None),
        [name, volume, rest] => (*name, *volume, Some(*rest)),
        _ => return Err(invalid("expected MUSCLE:EXERCISE:SETSxREPS[:REST]")),
    };

    let (sets, reps) = volume
        .split_once(['x', 'X'])
        .ok_or_else(|| invalid("sets and reps must look like 3x10"))?;
    let sets = sets.trim().parse::<i64>().map_err(|_| invalid("sets must be a number"))?;
    let reps = reps.trim().parse::<i64>().map_err(|_| invalid("reps must be a number"))?;
    let rest = rest.and_then(|r| r.parse::<i64>().ok());

    let muscle = resolve_muscle(muscle, name)?;
    ExercisePlan::new(muscle, name, sets, reps, rest)
}

fn resolve_muscle(muscle: Option<&str>, exercise: &str) -> pulsefit::Result<MuscleGroup> {
    if let Some(m) = muscle {
        return m.parse::<MuscleGroup>().map_err(FitError::InvalidTemplate);
    }

    match groups_for_exercise(exercise) {
        [only] => Ok(*only),
        [] => Err(FitError::InvalidTemplate(format!(
            "`{}` is not in the exercise catalog",
            exercise.trim()
        ))),
        many => Err(FitError::InvalidTemplate(format!(
            "`{}` belongs to {} -- prefix it with one of them",
            exercise.trim(),
            many.iter().join(" and ")
        ))),
    }
}

fn print_allowed_muscles() {
    let allowed: BTreeSet<&str> = ALLOWED_MUSCLES.iter().copied().collect();
    println!("{} {}", "Allowed muscles:".cyan().bold(), allowed.iter().join(", "));
    println!(
        "{} Browse exercises with `exercise list --muscle <MUSCLE>`",
        "Note:".blue().bold()
    );
}

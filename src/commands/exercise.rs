use anyhow::Result;
use colored::Colorize;
use itertools::Itertools;
use pulsefit::{MuscleGroup, types::groups_for_exercise};
use serde::Serialize;

use super::{OutputFmt, emit, print_columns};
use crate::cli::ExerciseCmd;

#[derive(Serialize)]
struct ExJson {
    name: &'static str,
    muscle: MuscleGroup,
    /// Other groups listing the same exercise.
    also: Vec<MuscleGroup>,
}

fn catalog(filter: Option<MuscleGroup>) -> Vec<ExJson> {
    MuscleGroup::ALL
        .into_iter()
        .filter(|m| filter.is_none_or(|f| f == *m))
        .flat_map(|muscle| {
            muscle.exercises().iter().map(move |&name| ExJson {
                name,
                muscle,
                also: groups_for_exercise(name)
                    .iter()
                    .copied()
                    .filter(|g| *g != muscle)
                    .collect(),
            })
        })
        .collect()
}

pub fn handle(cmd: ExerciseCmd, fmt: OutputFmt) -> Result<()> {
    match cmd {
        ExerciseCmd::List { muscle } => {
            let rows = catalog(muscle);

            emit(fmt, &rows, || {
                println!("{}", "Exercises:".cyan().bold());

                let mut left = Vec::<String>::new();
                let mut right = Vec::<String>::new();
                for (muscle, group) in &rows.iter().chunk_by(|r| r.muscle) {
                    left.push(format!(" {}", muscle.to_string().yellow().bold()));
                    right.push(String::new());

                    for ex in group {
                        left.push(format!("   • {}", ex.name.bold()));
                        right.push(if ex.also.is_empty() {
                            String::new()
                        } else {
                            format!("also {}", ex.also.iter().join(", ")).dimmed().to_string()
                        });
                    }
                }

                print_columns(left, right);
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_catalog_covers_every_group() {
        let rows = catalog(None);
        let total: usize = MuscleGroup::ALL.iter().map(|m| m.exercises().len()).sum();
        assert_eq!(rows.len(), total);
    }

    #[test]
    fn filter_keeps_one_group_and_notes_shared_entries() {
        let rows = catalog(Some(MuscleGroup::Shoulders));
        assert!(rows.iter().all(|r| r.muscle == MuscleGroup::Shoulders));

        let face_pulls = rows.iter().find(|r| r.name == "Face Pulls").unwrap();
        assert_eq!(face_pulls.also, vec![MuscleGroup::Back]);
    }
}

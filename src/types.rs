use once_cell::sync::Lazy;
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};
use strsim::jaro_winkler;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The fixed set of muscle groups exercises are filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Biceps,
    Triceps,
    Core,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 7] = [
        Self::Chest,
        Self::Back,
        Self::Legs,
        Self::Shoulders,
        Self::Biceps,
        Self::Triceps,
        Self::Core,
    ];

    /// Catalog entries for this group, in display order.
    pub fn exercises(&self) -> &'static [&'static str] {
        match self {
            Self::Chest => &[
                "Barbell Bench Press",
                "Dumbbell Bench Press",
                "Incline Barbell Bench Press",
                "Incline Dumbbell Press",
                "Decline Barbell Press",
                "Decline Dumbbell Press",
                "Dumbbell Flyes",
                "Cable Flyes",
                "Chest Press Machine",
                "Pec Deck Machine",
                "Push-Ups",
                "Dips (Chest Focus)",
            ],
            Self::Back => &[
                "Barbell Deadlift",
                "Barbell Row",
                "Dumbbell Row",
                "T-Bar Row",
                "Lat Pulldown",
                "Pull-Ups",
                "Chin-Ups",
                "Seated Cable Row",
                "Face Pulls",
                "Hyperextensions",
                "Shrugs (Barbell)",
                "Shrugs (Dumbbell)",
            ],
            Self::Legs => &[
                "Barbell Squat",
                "Front Squat",
                "Leg Press",
                "Romanian Deadlift",
                "Leg Curl",
                "Leg Extension",
                "Walking Lunges",
                "Bulgarian Split Squat",
                "Hack Squat",
                "Calf Raises (Standing)",
                "Calf Raises (Seated)",
                "Goblet Squat",
            ],
            Self::Shoulders => &[
                "Barbell Overhead Press",
                "Dumbbell Shoulder Press",
                "Arnold Press",
                "Lateral Raises",
                "Front Raises",
                "Rear Delt Flyes",
                "Face Pulls",
                "Upright Row",
                "Machine Shoulder Press",
                "Cable Lateral Raises",
                "Reverse Pec Deck",
            ],
            Self::Biceps => &[
                "Barbell Curl",
                "Dumbbell Curl",
                "Hammer Curl",
                "Preacher Curl",
                "Cable Curl",
                "Concentration Curl",
                "Incline Dumbbell Curl",
                "EZ Bar Curl",
                "21s",
                "Spider Curl",
            ],
            Self::Triceps => &[
                "Close Grip Bench Press",
                "Tricep Dips",
                "Overhead Tricep Extension",
                "Skull Crushers",
                "Cable Pushdown",
                "Rope Pushdown",
                "Dumbbell Kickback",
                "Diamond Push-Ups",
                "Overhead Cable Extension",
                "Single Arm Cable Extension",
            ],
            Self::Core => &[
                "Plank",
                "Side Plank",
                "Crunches",
                "Bicycle Crunches",
                "Russian Twists",
                "Leg Raises",
                "Hanging Leg Raises",
                "Cable Crunches",
                "Ab Wheel Rollout",
                "Mountain Climbers",
                "Dead Bug",
                "Pallof Press",
            ],
        }
    }

    /// Returns the catalog spelling of `name` if it belongs to this group.
    /// Matching ignores ASCII case.
    pub fn find_exercise(&self, name: &str) -> Option<&'static str> {
        let name = name.trim();
        self.exercises()
            .iter()
            .copied()
            .find(|e| e.eq_ignore_ascii_case(name))
    }
}

impl Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Chest => "chest",
            Self::Back => "back",
            Self::Legs => "legs",
            Self::Shoulders => "shoulders",
            Self::Biceps => "biceps",
            Self::Triceps => "triceps",
            Self::Core => "core",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for MuscleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        canonical_muscle(s)
            .and_then(|raw| MuscleGroup::ALL.into_iter().find(|m| m.to_string() == raw))
            .ok_or_else(|| format!("unknown muscle group `{}`", s.trim()))
    }
}

pub static ALLOWED_MUSCLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["chest", "back", "legs", "shoulders", "biceps", "triceps", "core"])
});

/// Lowercased exercise name -> every group listing it ("Face Pulls" sits under two).
static EXERCISE_GROUPS: Lazy<HashMap<String, Vec<MuscleGroup>>> = Lazy::new(|| {
    let mut map: HashMap<String, Vec<MuscleGroup>> = HashMap::new();
    for group in MuscleGroup::ALL {
        for name in group.exercises() {
            map.entry(name.to_ascii_lowercase()).or_default().push(group);
        }
    }
    map
});

/// Groups whose catalog contains `name`.
pub fn groups_for_exercise(name: &str) -> &'static [MuscleGroup] {
    EXERCISE_GROUPS
        .get(&name.trim().to_ascii_lowercase())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Returns the canonical lowercase muscle name or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<String> {
    let m = m.as_ref().trim().to_ascii_lowercase();
    if ALLOWED_MUSCLES.contains(m.as_str()) {
        Some(m)
    } else {
        None
    }
}

/// Return the closest catalog exercise of `group` for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_exercise_suggestion(group: MuscleGroup, input: &str) -> Option<&'static str> {
    let inp = input.trim().to_ascii_lowercase();
    if inp.is_empty() {
        return None;
    }

    let mut scores: Vec<(&'static str, f64)> = group
        .exercises()
        .iter()
        .copied()
        .map(|e| (e, jaro_winkler(&inp, &e.to_ascii_lowercase())))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}

use clap::{Parser, Subcommand};
use pulsefit::MuscleGroup;

#[derive(Parser)]
#[command(name = "pulsefit", version, about = "Workout, body and nutrition tracker")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a workout or look at past ones
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Workout template management
    #[command(subcommand, visible_alias = "t")]
    Template(TemplateCmd),

    /// Browse the exercise catalog
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Body measurements
    #[command(subcommand, visible_alias = "m")]
    Measure(MeasureCmd),

    /// Nutrition log
    #[command(subcommand)]
    Meal(MealCmd),

    /// Total workouts, streak and volume lifted
    Stats,

    /// Show workouts in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// View or edit pulsefit config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a workout from a template and follow it live
    #[command(visible_alias = "s")]
    Start {
        /// Template index (from `template list`) or exact name; defaults to the first
        template: Option<String>,
    },

    /// Show recent workouts, newest first
    #[command(visible_alias = "h")]
    History {
        /// How many workouts to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum TemplateCmd {
    /// Build a template from the command line
    /// - Usage: template add NAME -e "chest:Barbell Bench Press:3x10:90"
    #[command(visible_alias = "a", verbatim_doc_comment)]
    Add {
        /// Workout name
        name: String,

        /// MUSCLE:EXERCISE:SETSxREPS[:REST_SECONDS], repeatable
        #[arg(short, long = "exercise", value_name = "EXERCISE", required = true)]
        exercises: Vec<String>,
    },

    /// Import one or more templates from TOML files
    #[command(visible_alias = "i")]
    Import { files: Vec<String> },

    /// List templates
    #[command(visible_alias = "l")]
    List,

    /// Show a single template in detail
    #[command(visible_alias = "s")]
    Show {
        /// Template index (from `template list`) or exact name
        template: String,
    },

    /// Delete a template
    #[command(visible_alias = "d")]
    Delete {
        /// Template index (from `template list`) or exact name
        template: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCmd {
    /// List catalog exercises
    #[command(visible_alias = "l")]
    List {
        /// Only this muscle group
        #[arg(short, long)]
        muscle: Option<MuscleGroup>,
    },
}

#[derive(Subcommand)]
pub enum MeasureCmd {
    /// Record body weight (kg) and optionally body fat (%)
    #[command(visible_alias = "a")]
    Add {
        weight: String,

        #[arg(short, long)]
        body_fat: Option<String>,
    },

    /// Show the last measurements, newest first
    #[command(visible_alias = "l")]
    List {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum MealCmd {
    /// Log a meal for today
    #[command(visible_alias = "a")]
    Add {
        name: String,

        calories: String,

        /// Protein in grams
        #[arg(short, long)]
        protein: Option<String>,

        /// Carbohydrates in grams
        #[arg(short, long)]
        carbs: Option<String>,

        /// Fats in grams
        #[arg(short, long)]
        fats: Option<String>,
    },

    /// Today's totals and meals
    #[command(visible_alias = "t")]
    Today,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}

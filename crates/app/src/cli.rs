use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use trener_core::model::RecordId;

#[derive(Parser)]
#[command(name = "trener", version, about = "Guided gym sessions in the terminal")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// SQLite database URL or path
    #[arg(global = true, long)]
    pub db: Option<String>,

    /// Config file (defaults to the platform config dir)
    #[arg(global = true, long)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `services=debug`
    #[arg(global = true, long)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a guided training session
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// List saved sessions, newest first
    #[command(visible_alias = "h")]
    History {
        #[command(flatten)]
        user: UserArg,

        /// Show at most this many sessions
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Lifetime totals and recent sessions
    Stats {
        #[command(flatten)]
        user: UserArg,
    },

    /// Print a saved session as JSON
    Show {
        /// Record id as printed by `history`
        id: RecordId,
    },

    /// Manage saved workout plans
    #[command(subcommand)]
    Plan(PlanCommand),
}

#[derive(Subcommand)]
pub enum PlanCommand {
    /// Save a workout under a name, replacing any plan of that name
    Add(PlanAddArgs),

    /// List saved plans
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        user: UserArg,
    },

    /// Delete a saved plan
    #[command(visible_alias = "rm")]
    Remove {
        #[command(flatten)]
        user: UserArg,

        /// Plan name
        #[arg(value_name = "NAME")]
        plan_name: String,
    },
}

#[derive(Args)]
pub struct PlanAddArgs {
    #[command(flatten)]
    pub user: UserArg,

    /// Name to save the plan under
    #[arg(value_name = "NAME")]
    pub plan_name: String,

    /// Free-form note shown by `plan list`
    #[arg(short, long)]
    pub description: Option<String>,

    #[command(flatten)]
    pub workout: WorkoutArgs,
}

#[derive(Args)]
pub struct UserArg {
    /// User id (falls back to config / TRENER_USER_ID)
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub user: UserArg,

    /// Saved plan to run (see `trener plan list`)
    #[arg(long, conflicts_with_all = ["plan", "group", "name", "exercise"])]
    pub saved: Option<String>,

    #[command(flatten)]
    pub workout: WorkoutArgs,
}

/// A workout given as a plan file or inline flags.
#[derive(Args)]
pub struct WorkoutArgs {
    /// Workout plan file (TOML with muscle_group, name, exercises)
    #[arg(short, long, conflicts_with_all = ["group", "name", "exercise"])]
    pub plan: Option<PathBuf>,

    /// Muscle group of an ad-hoc workout
    #[arg(short, long, requires = "name")]
    pub group: Option<String>,

    /// Session name of an ad-hoc workout
    #[arg(short, long, requires = "group")]
    pub name: Option<String>,

    /// Exercise of an ad-hoc workout; repeat for each one, in order
    #[arg(short, long)]
    pub exercise: Vec<String>,
}

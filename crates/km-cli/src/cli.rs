//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    add::AddArgs, delete::DeleteArgs, edit::EditArgs, history::HistoryArgs, replay::ReplayArgs,
    reset::ResetArgs, simulate::SimulateArgs, totals::TotalsArgs,
};

/// Personal distance tracker.
///
/// Turns GPS fixes into sessions with distance, speed and duration, and keeps
/// a local ledger of finished trips.
#[derive(Debug, Parser)]
#[command(name = "kmtrack", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a synthetic tracking session and record it.
    Simulate(SimulateArgs),

    /// Track a session from a recorded JSON-lines fix script.
    Replay(ReplayArgs),

    /// Add a trip by hand.
    Add(AddArgs),

    /// Edit an existing trip.
    Edit(EditArgs),

    /// Delete a trip.
    Delete(DeleteArgs),

    /// List recorded trips, newest first.
    History(HistoryArgs),

    /// Show distance totals by activity and month.
    Totals(TotalsArgs),

    /// Delete every recorded trip.
    Reset(ResetArgs),

    /// Show configuration and ledger status.
    Status,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_with_activity() {
        let cli = Cli::try_parse_from([
            "kmtrack",
            "simulate",
            "--speed",
            "18",
            "--seconds",
            "30",
            "--activity",
            "cycling",
        ])
        .unwrap();
        let Some(Commands::Simulate(args)) = cli.command else {
            panic!("expected simulate");
        };
        assert!((args.speed - 18.0).abs() < f64::EPSILON);
        assert_eq!(args.seconds, 30);
        assert_eq!(args.activity, Some(km_core::ActivityType::Cycling));
    }

    #[test]
    fn rejects_unknown_activity() {
        let result = Cli::try_parse_from(["kmtrack", "add", "--km", "3", "--activity", "flying"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["kmtrack", "status", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}

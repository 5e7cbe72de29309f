use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use km_cli::commands::{add, delete, edit, history, replay, reset, simulate, status, totals};
use km_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Simulate(args) => simulate::run(&mut out, args, &config)?,
        Commands::Replay(args) => replay::run(&mut out, args, &config)?,
        Commands::Add(args) => add::run(&mut out, args, &config)?,
        Commands::Edit(args) => edit::run(&mut out, args, &config)?,
        Commands::Delete(args) => delete::run(&mut out, args, &config)?,
        Commands::History(args) => history::run(&mut out, args, &config)?,
        Commands::Totals(args) => totals::run(&mut out, args, &config)?,
        Commands::Reset(args) => reset::run(&mut out, args, &config)?,
        Commands::Status => status::run(&mut out, &config)?,
    }

    Ok(())
}

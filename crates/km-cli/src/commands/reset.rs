//! Reset command: wipe the trip ledger.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use crate::Config;
use crate::commands::util::open_ledger;

#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Confirm deleting every trip.
    #[arg(long)]
    pub yes: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ResetArgs, config: &Config) -> Result<()> {
    if !args.yes {
        bail!("refusing to delete all trips without --yes");
    }

    let mut ledger = open_ledger(config)?;
    let removed = ledger.len();
    ledger.reset_all()?;
    tracing::debug!(removed, "ledger reset");

    writeln!(writer, "Deleted {removed} trip(s).")?;
    Ok(())
}

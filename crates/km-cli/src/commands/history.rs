//! History command listing recorded trips.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use crate::Config;
use crate::commands::util::{format_entry_line, open_ledger};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &HistoryArgs, config: &Config) -> Result<()> {
    let ledger = open_ledger(config)?;
    let entries = ledger.entries();

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No trips recorded.")?;
        return Ok(());
    }

    for entry in &entries {
        writeln!(writer, "{}", format_entry_line(entry))?;
    }
    Ok(())
}

//! Status command for showing configuration and ledger state.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::commands::util::{format_entry_line, open_ledger};

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let ledger = open_ledger(config)?;

    writeln!(writer, "Distance tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Default activity: {}", config.default_activity)?;
    writeln!(
        writer,
        "Simulation origin: {:.4}, {:.4}",
        config.origin_latitude, config.origin_longitude
    )?;

    let entries = ledger.entries();
    let Some(latest) = entries.first() else {
        writeln!(writer, "No trips recorded.")?;
        return Ok(());
    };

    writeln!(
        writer,
        "Trips: {} ({:.2} km total)",
        entries.len(),
        ledger.total_km()
    )?;
    writeln!(writer, "Latest: {}", format_entry_line(latest))?;
    Ok(())
}

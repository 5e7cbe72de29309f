//! Add command for manual trips.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use clap::Args;
use km_core::{ActivityType, NewTripEntry};

use crate::Config;
use crate::commands::util::open_ledger;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Distance in kilometers.
    #[arg(long)]
    pub km: f64,

    /// Trip date as YYYY-MM-DD (defaults to today, UTC).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Activity type (defaults to the configured one).
    #[arg(long)]
    pub activity: Option<ActivityType>,

    /// Free-form note.
    #[arg(long)]
    pub description: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<()> {
    if !args.km.is_finite() || args.km < 0.0 {
        bail!("distance must be a non-negative number of kilometers");
    }

    let description = args
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(ToString::to_string);

    let mut ledger = open_ledger(config)?;
    let entry = ledger.add_entry(NewTripEntry {
        date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
        distance_km: args.km,
        activity: args.activity.unwrap_or(config.default_activity),
        description,
    })?;

    writeln!(
        writer,
        "Added trip {} ({}, {:.2} km on {})",
        entry.id, entry.activity, entry.distance_km, entry.date
    )?;
    Ok(())
}

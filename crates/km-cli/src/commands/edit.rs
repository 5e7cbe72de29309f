//! Edit command for correcting a recorded trip.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use km_core::{ActivityType, TripEntryUpdate};

use crate::Config;
use crate::commands::util::{format_entry_line, open_ledger, parse_trip_id};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// ID of the trip to edit.
    pub id: String,

    /// New distance in kilometers.
    #[arg(long)]
    pub km: Option<f64>,

    /// New date as YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// New activity type.
    #[arg(long)]
    pub activity: Option<ActivityType>,

    /// New description.
    #[arg(long)]
    pub description: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &EditArgs, config: &Config) -> Result<()> {
    let id = parse_trip_id(&args.id)?;
    let update = TripEntryUpdate {
        date: args.date,
        distance_km: args.km,
        activity: args.activity,
        description: args.description.clone(),
    };
    if update.is_empty() {
        bail!("nothing to change; pass --km, --date, --activity or --description");
    }

    let mut ledger = open_ledger(config)?;
    let entry = ledger.update_entry(&id, update)?;
    writeln!(writer, "Updated {}", format_entry_line(&entry))?;
    Ok(())
}

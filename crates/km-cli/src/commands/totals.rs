//! Totals command: distance aggregates over the ledger.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use km_core::ActivityType;
use serde::Serialize;

use crate::Config;
use crate::commands::util::open_ledger;

#[derive(Debug, Args)]
pub struct TotalsArgs {
    /// Only report one month, as YYYY-MM.
    #[arg(long)]
    pub month: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TotalsReport {
    total_km: f64,
    by_type: BTreeMap<ActivityType, f64>,
    by_month: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
struct MonthReport<'a> {
    month: &'a str,
    total_km: f64,
}

pub fn run<W: Write>(writer: &mut W, args: &TotalsArgs, config: &Config) -> Result<()> {
    let ledger = open_ledger(config)?;

    if let Some(month) = args.month.as_deref() {
        let total_km = ledger.total_for_month(month)?;
        if args.json {
            let report = MonthReport { month, total_km };
            writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            writeln!(writer, "{month}: {total_km:.2} km")?;
        }
        return Ok(());
    }

    let report = TotalsReport {
        total_km: ledger.total_km(),
        by_type: ledger.total_by_type(),
        by_month: ledger.total_by_month(),
    };

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(writer, "Total: {:.2} km", report.total_km)?;
    if report.by_type.is_empty() {
        return Ok(());
    }

    writeln!(writer, "By activity:")?;
    for (activity, km) in &report.by_type {
        writeln!(writer, "  {activity:<8} {km:>8.2} km")?;
    }
    writeln!(writer, "By month:")?;
    for (month, km) in report.by_month.iter().rev() {
        writeln!(writer, "  {month}  {km:>8.2} km")?;
    }
    Ok(())
}

//! Delete command for removing a trip.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use crate::Config;
use crate::commands::util::{open_ledger, parse_trip_id};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// ID of the trip to delete.
    pub id: String,
}

pub fn run<W: Write>(writer: &mut W, args: &DeleteArgs, config: &Config) -> Result<()> {
    let id = parse_trip_id(&args.id)?;
    let mut ledger = open_ledger(config)?;

    match ledger.delete_entry(&id)? {
        Some(entry) => writeln!(
            writer,
            "Deleted trip {} ({}, {:.2} km on {})",
            entry.id, entry.activity, entry.distance_km, entry.date
        )?,
        None => writeln!(writer, "No trip with id {id}.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use km_core::{ActivityType, NewTripEntry};

    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn delete_removes_trip_then_reports_missing() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("kmtrack.db"),
            ..Config::default()
        };
        let entry = open_ledger(&config)
            .unwrap()
            .add_entry(NewTripEntry {
                date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
                distance_km: 7.0,
                activity: ActivityType::Cycling,
                description: None,
            })
            .unwrap();
        let args = DeleteArgs {
            id: entry.id.to_string(),
        };

        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();
        run(&mut output, &args, &config).unwrap();

        assert!(open_ledger(&config).unwrap().is_empty());
        let output = String::from_utf8(output).unwrap();
        let output = output.replace(entry.id.as_str(), "[ID]");
        assert_snapshot!(output, @r"
        Deleted trip [ID] (cycling, 7.00 km on 2025-02-03)
        No trip with id [ID].
        ");
    }
}

//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result};
use km_core::{ActivityType, Session, TripEntry, TripId, format_duration};
use km_store::{SqliteStore, TripLedger};

use crate::Config;

/// Opens the ledger at the configured path, creating the parent directory.
pub fn open_ledger(config: &Config) -> Result<TripLedger<SqliteStore>> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(TripLedger::load(store))
}

/// Parses a user-supplied trip ID.
pub fn parse_trip_id(raw: &str) -> Result<TripId> {
    TripId::new(raw.trim()).context("trip id cannot be empty")
}

/// Writes the end-of-session summary block.
pub fn write_session_summary<W: Write>(writer: &mut W, session: &Session) -> Result<()> {
    writeln!(writer, "Session finished")?;
    writeln!(writer, "Distance: {:.2} km", session.total_distance_km)?;
    writeln!(
        writer,
        "Duration: {}",
        format_duration(session.duration_ms().unwrap_or(0))
    )?;
    writeln!(writer, "Max speed: {:.1} km/h", session.max_speed_kmh)?;
    writeln!(writer, "Average speed: {:.1} km/h", session.average_speed_kmh)?;
    writeln!(writer, "Samples: {}", session.positions.len())?;
    Ok(())
}

/// Records a finished session and reports the outcome.
pub fn record_session<W: Write>(
    writer: &mut W,
    ledger: &mut TripLedger<SqliteStore>,
    session: &Session,
    activity: ActivityType,
) -> Result<Option<TripEntry>> {
    let entry = ledger
        .record_session(session, activity)
        .context("failed to record session")?;
    match &entry {
        Some(entry) => writeln!(
            writer,
            "Recorded trip {} ({}, {:.2} km)",
            entry.id, entry.activity, entry.distance_km
        )?,
        None => writeln!(writer, "No distance covered; nothing recorded.")?,
    }
    Ok(entry)
}

/// One line of the trip listing.
pub fn format_entry_line(entry: &TripEntry) -> String {
    let mut line = format!(
        "{}  {:<8} {:>8.2} km  {}",
        entry.date, entry.activity, entry.distance_km, entry.id
    );
    if let Some(description) = &entry.description {
        line.push_str("  ");
        line.push_str(description);
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn entry_line_includes_description() {
        let entry = TripEntry {
            id: TripId::new("trip-1").unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 1, 29).unwrap(),
            distance_km: 12.5,
            activity: ActivityType::Cycling,
            description: Some("river loop".to_string()),
        };
        assert_eq!(
            format_entry_line(&entry),
            "2025-01-29  cycling     12.50 km  trip-1  river loop"
        );
    }

    #[test]
    fn blank_trip_id_is_rejected() {
        assert!(parse_trip_id("   ").is_err());
        assert_eq!(parse_trip_id(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn open_ledger_creates_parent_directory() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: temp.path().join("nested/dir/kmtrack.db"),
            ..Config::default()
        };
        let ledger = open_ledger(&config).unwrap();
        assert!(ledger.is_empty());
        assert!(config.database_path.exists());
    }
}

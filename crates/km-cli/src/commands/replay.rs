//! Replay command: track a session from a recorded fix script.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use km_core::position::ReplayEvent;
use km_core::{ActivityType, PermissionState, ReplayProvider, SessionAccumulator, TrackingError};

use crate::Config;
use crate::commands::util::{open_ledger, record_session, write_session_summary};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON-lines file of `fix` and `error` events.
    pub file: PathBuf,

    /// Activity to record the trip as (defaults to the configured one).
    #[arg(long)]
    pub activity: Option<ActivityType>,

    /// Location permission at the start of the replay: granted, denied or prompt.
    #[arg(long, default_value = "granted")]
    pub permission: PermissionState,
}

pub fn run<W: Write>(writer: &mut W, args: &ReplayArgs, config: &Config) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let events = ReplayProvider::parse_script(&content)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    let mut ledger = open_ledger(config)?;

    // Sessions start at the first recorded fix so durations match the recording.
    let fix_times: Vec<i64> = events
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::Fix(fix) => Some(fix.timestamp_ms),
            ReplayEvent::Error(_) => None,
        })
        .collect();
    let now_ms = Utc::now().timestamp_millis();
    let start_ms = fix_times.first().copied().unwrap_or(now_ms);
    let end_ms = fix_times.last().copied().unwrap_or(start_ms);

    let provider = ReplayProvider::from_events(events).with_permission(args.permission);
    let mut tracker = SessionAccumulator::new(provider);
    match tracker.begin_session_at(start_ms) {
        Ok(_) => {}
        Err(TrackingError::PermissionDenied) => {
            writeln!(writer, "Location permission denied; nothing recorded.")?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }
    let mut processed = 0;
    while !tracker.source_exhausted() {
        processed += tracker.pump_at(end_ms);
    }
    tracing::debug!(processed, "replay drained");

    if tracker.take_revoked_session().is_some() {
        writeln!(
            writer,
            "Location permission revoked during replay; session discarded."
        )?;
        return Ok(());
    }

    let session = tracker.end_session_at(end_ms)?;
    write_session_summary(writer, &session)?;
    let activity = args.activity.unwrap_or(config.default_activity);
    record_session(writer, &mut ledger, &session, activity)?;
    Ok(())
}

//! Simulate command: a synthetic tracking session.

use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::Args;
use km_core::{ActivityType, Session, SessionAccumulator, SimulatedProvider};

use crate::Config;
use crate::commands::util::{open_ledger, record_session, write_session_summary};

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Target speed in km/h.
    #[arg(long)]
    pub speed: f64,

    /// Number of one-second ticks to run.
    #[arg(long, default_value_t = 60)]
    pub seconds: u32,

    /// Activity to record the trip as (defaults to the configured one).
    #[arg(long)]
    pub activity: Option<ActivityType>,

    /// Sleep one second per tick and print live progress.
    #[arg(long)]
    pub realtime: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &SimulateArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Utc::now().timestamp_millis())
}

/// Like [`run`], with the session starting at `now_ms`.
pub fn run_at<W: Write>(
    writer: &mut W,
    args: &SimulateArgs,
    config: &Config,
    now_ms: i64,
) -> Result<()> {
    if !args.speed.is_finite() || args.speed < 0.0 {
        bail!("speed must be a non-negative number of km/h");
    }

    let mut ledger = open_ledger(config)?;
    let session = simulate(writer, args, config, now_ms)?;

    write_session_summary(writer, &session)?;
    let activity = args.activity.unwrap_or(config.default_activity);
    record_session(writer, &mut ledger, &session, activity)?;
    Ok(())
}

fn simulate<W: Write>(
    writer: &mut W,
    args: &SimulateArgs,
    config: &Config,
    now_ms: i64,
) -> Result<Session> {
    let provider = SimulatedProvider::new(config.origin_latitude, config.origin_longitude)
        .with_speed(args.speed)
        .starting_at(now_ms);
    let mut tracker = SessionAccumulator::new(provider);

    tracker.begin_session_at(now_ms)?;
    tracker.pump_at(now_ms);

    for tick in 1..=args.seconds {
        if args.realtime {
            thread::sleep(Duration::from_secs(1));
        }
        tracker.tick();

        if args.realtime {
            let distance = tracker
                .signals()
                .active_session
                .get()
                .map_or(0.0, |s| s.total_distance_km);
            writeln!(
                writer,
                "{tick:>4}s  {:>6.1} km/h  {distance:.3} km",
                tracker.signals().current_speed_kmh.get()
            )?;
        }
    }

    let last_fix_ms = tracker
        .session()
        .and_then(|s| s.positions.last())
        .map_or(now_ms, |sample| sample.timestamp_ms);
    let end_ms = if args.realtime {
        Utc::now().timestamp_millis().max(last_fix_ms)
    } else {
        last_fix_ms
    };
    Ok(tracker.end_session_at(end_ms)?)
}

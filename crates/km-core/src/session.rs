//! Tracking sessions: one continuous interval from start to stop.

use serde::{Deserialize, Serialize};

use crate::sample::Sample;
use crate::types::SessionId;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A tracking session and its running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// When tracking started, in epoch milliseconds.
    pub start_time_ms: i64,
    /// Set when the session is stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<i64>,
    /// Never decreases while the session is active.
    pub total_distance_km: f64,
    pub max_speed_kmh: f64,
    pub average_speed_kmh: f64,
    /// Every sample received, in arrival order.
    #[serde(default)]
    pub positions: Vec<Sample>,
}

/// Lightweight view of a session for state broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub start_time_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<i64>,
    pub total_distance_km: f64,
    pub max_speed_kmh: f64,
    pub average_speed_kmh: f64,
    pub sample_count: usize,
}

impl Session {
    /// Creates an empty session starting at `start_time_ms`.
    pub const fn start(id: SessionId, start_time_ms: i64) -> Self {
        Self {
            id,
            start_time_ms,
            end_time_ms: None,
            total_distance_km: 0.0,
            max_speed_kmh: 0.0,
            average_speed_kmh: 0.0,
            positions: Vec::new(),
        }
    }

    pub const fn is_active(&self) -> bool {
        self.end_time_ms.is_none()
    }

    /// Elapsed time between start and stop, or `None` while still active.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time_ms
            .map(|end| end.saturating_sub(self.start_time_ms).max(0))
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            start_time_ms: self.start_time_ms,
            end_time_ms: self.end_time_ms,
            total_distance_km: self.total_distance_km,
            max_speed_kmh: self.max_speed_kmh,
            average_speed_kmh: self.average_speed_kmh,
            sample_count: self.positions.len(),
        }
    }

    /// Folds a sample into the totals.
    ///
    /// `anchor` is the previous reference sample. Without one the sample is
    /// only recorded; distance and speed statistics are left alone.
    pub(crate) fn record(&mut self, sample: Sample, anchor: Option<&Sample>) {
        self.positions.push(sample);

        let Some(anchor) = anchor else {
            return;
        };

        let step = anchor.distance_km(&sample);
        if step.is_finite() {
            self.total_distance_km += step;
        }
        self.max_speed_kmh = self.max_speed_kmh.max(sample.speed_kmh);

        let Some(elapsed_ms) = sample.timestamp_ms.checked_sub(self.start_time_ms) else {
            return;
        };
        #[expect(
            clippy::cast_precision_loss,
            reason = "session durations are far below 2^52 ms"
        )]
        let elapsed_hours = elapsed_ms as f64 / MS_PER_HOUR;
        if elapsed_hours > 0.0 {
            self.average_speed_kmh = self.total_distance_km / elapsed_hours;
        }
    }

    pub(crate) const fn finish(&mut self, end_time_ms: i64) {
        self.end_time_ms = Some(end_time_ms);
    }
}

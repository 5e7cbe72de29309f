//! Trip ledger entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::types::{TripId, ValidationError};

/// How a trip was travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Walking,
    Running,
    Cycling,
    Driving,
}

impl ActivityType {
    pub const ALL: [Self; 4] = [Self::Walking, Self::Running, Self::Cycling, Self::Driving];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Cycling => "cycling",
            Self::Driving => "driving",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walking" => Ok(Self::Walking),
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            "driving" => Ok(Self::Driving),
            _ => Err(ValidationError::InvalidActivity {
                value: s.to_string(),
            }),
        }
    }
}

/// A completed trip as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEntry {
    pub id: TripId,
    /// Calendar day of the trip, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub distance_km: f64,
    pub activity: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TripEntry {
    /// Attaches an ID to a new entry.
    pub fn new(id: TripId, entry: NewTripEntry) -> Self {
        Self {
            id,
            date: entry.date,
            distance_km: entry.distance_km,
            activity: entry.activity,
            description: entry.description,
        }
    }

    /// Month key (`YYYY-MM`) used for monthly totals.
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// A trip before the ledger assigns it an ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTripEntry {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub activity: ActivityType,
    pub description: Option<String>,
}

impl NewTripEntry {
    /// Builds an entry for a finished session.
    ///
    /// Returns `None` when the session covered no distance. The entry is dated
    /// on the (UTC) day the session started.
    pub fn from_session(session: &Session, activity: ActivityType) -> Option<Self> {
        if session.total_distance_km <= 0.0 || !session.total_distance_km.is_finite() {
            return None;
        }
        let date = DateTime::<Utc>::from_timestamp_millis(session.start_time_ms)?.date_naive();
        let duration = session.duration_ms().unwrap_or(0);
        Some(Self {
            date,
            distance_km: session.total_distance_km,
            activity,
            description: Some(format!(
                "GPS session: {:.1} km in {}",
                session.total_distance_km,
                format_duration(duration)
            )),
        })
    }
}

/// Partial user edit of an existing entry. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripEntryUpdate {
    pub date: Option<NaiveDate>,
    pub distance_km: Option<f64>,
    pub activity: Option<ActivityType>,
    pub description: Option<String>,
}

impl TripEntryUpdate {
    pub const fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.distance_km.is_none()
            && self.activity.is_none()
            && self.description.is_none()
    }

    /// Applies the edit in place, keeping the entry's ID.
    pub fn apply(self, entry: &mut TripEntry) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(distance_km) = self.distance_km {
            entry.distance_km = distance_km;
        }
        if let Some(activity) = self.activity {
            entry.activity = activity;
        }
        if let Some(description) = self.description {
            entry.description = Some(description);
        }
    }
}

/// Formats a duration as `1h 5m`, `3m 4s` or `42s`.
pub fn format_duration(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

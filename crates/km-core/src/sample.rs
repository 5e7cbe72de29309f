//! Raw platform fixes and the normalized samples derived from them.

use serde::{Deserialize, Serialize};

use crate::geo;

/// Conversion factor from meters per second to kilometers per hour.
const MPS_TO_KMH: f64 = 3.6;

/// One location reading as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in meters per second, if the platform reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// A normalized position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    /// Speed in km/h, never negative.
    pub speed_kmh: f64,
    pub timestamp_ms: i64,
}

impl Sample {
    pub const fn new(latitude: f64, longitude: f64, speed_kmh: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            speed_kmh,
            timestamp_ms,
        }
    }

    /// Great-circle distance to another sample, in kilometers.
    pub fn distance_km(&self, other: &Self) -> f64 {
        geo::haversine_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl From<RawFix> for Sample {
    fn from(fix: RawFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            speed_kmh: speed_kmh(fix.speed_mps),
            timestamp_ms: fix.timestamp_ms,
        }
    }
}

/// Converts a raw platform speed to km/h.
///
/// Missing, non-finite and negative speeds all report as 0.
pub fn speed_kmh(speed_mps: Option<f64>) -> f64 {
    match speed_mps {
        Some(mps) if mps.is_finite() && mps > 0.0 => mps * MPS_TO_KMH,
        _ => 0.0,
    }
}

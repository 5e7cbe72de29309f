//! Synthetic location provider.
//!
//! Produces one fix per [`tick`](SimulatedProvider::tick), each one second
//! after the previous, moving at the target speed along a heading that
//! wobbles slowly around a base bearing. Fixes carry their speed in m/s so they
//! take exactly the same normalization path as platform fixes.
//!
//! The provider does not own a timer. Whoever drives the event loop calls
//! `tick` once per second (or as fast as it likes in tests).

use chrono::Utc;

use super::{FixSink, LocationProvider, PermissionState, WatchId, WatchOptions};
use crate::error::TrackingError;
use crate::geo;
use crate::sample::RawFix;

/// Simulated time between fixes.
pub const TICK_MS: i64 = 1_000;

const BASE_HEADING_DEG: f64 = 45.0;
const HEADING_WOBBLE_DEG: f64 = 25.0;
const HEADING_WOBBLE_RATE: f64 = 0.1;

/// Location provider driven by a target speed instead of a GPS receiver.
#[derive(Debug)]
pub struct SimulatedProvider {
    latitude: f64,
    longitude: f64,
    speed_kmh: f64,
    start_time_ms: Option<i64>,
    clock_ms: i64,
    ticks: u64,
    sink: Option<FixSink>,
    watch: Option<WatchId>,
    next_watch: u32,
}

impl SimulatedProvider {
    /// Starts at `(latitude, longitude)`, standing still.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed_kmh: 0.0,
            start_time_ms: None,
            clock_ms: 0,
            ticks: 0,
            sink: None,
            watch: None,
            next_watch: 1,
        }
    }

    #[must_use]
    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.set_speed(speed_kmh);
        self
    }

    /// Pins the timestamp of the first fix instead of using the wall clock.
    #[must_use]
    pub const fn starting_at(mut self, timestamp_ms: i64) -> Self {
        self.start_time_ms = Some(timestamp_ms);
        self
    }

    /// Changes the target speed. Negative or non-finite values stop movement.
    pub fn set_speed(&mut self, speed_kmh: f64) {
        self.speed_kmh = if speed_kmh.is_finite() {
            speed_kmh.max(0.0)
        } else {
            0.0
        };
    }

    pub const fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Current simulated coordinate.
    pub const fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub const fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Advances one second and emits the new fix.
    ///
    /// Returns `false` when nothing is watching or the stream was stopped.
    pub fn tick(&mut self) -> bool {
        let Some(sink) = self.sink.as_ref() else {
            return false;
        };

        self.ticks += 1;
        #[expect(
            clippy::cast_precision_loss,
            reason = "tick counts stay far below 2^52"
        )]
        let heading = BASE_HEADING_DEG
            + HEADING_WOBBLE_DEG * (self.ticks as f64 * HEADING_WOBBLE_RATE).sin();
        let step_km = self.speed_kmh / 3600.0;
        (self.latitude, self.longitude) =
            geo::step_towards(self.latitude, self.longitude, heading, step_km);
        self.clock_ms += TICK_MS;

        let delivered = sink.fix(self.current_fix());
        if !delivered {
            self.sink = None;
        }
        delivered
    }

    fn current_fix(&self) -> RawFix {
        RawFix {
            latitude: self.latitude,
            longitude: self.longitude,
            speed_mps: Some(self.speed_kmh / 3.6),
            timestamp_ms: self.clock_ms,
        }
    }
}

impl LocationProvider for SimulatedProvider {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&mut self) -> PermissionState {
        PermissionState::Granted
    }

    fn watch(&mut self, sink: FixSink, _options: &WatchOptions) -> Result<WatchId, TrackingError> {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watch = Some(id);
        self.clock_ms = self
            .start_time_ms
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        self.ticks = 0;

        // Like a platform watch, report the current position right away.
        sink.fix(self.current_fix());
        self.sink = Some(sink);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.watch == Some(id) {
            self.watch = None;
            self.sink = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{PositionStream, PositionUpdate};

    #[test]
    fn tick_without_watch_does_nothing() {
        let mut provider = SimulatedProvider::new(40.0, -3.0).with_speed(60.0);
        assert!(!provider.tick());
        assert_eq!(provider.position(), (40.0, -3.0));
    }

    #[test]
    fn emits_initial_fix_then_one_per_tick() {
        let mut provider = SimulatedProvider::new(40.0, -3.0)
            .with_speed(36.0)
            .starting_at(10_000);
        let mut stream = PositionStream::start(&mut provider, &WatchOptions::default()).unwrap();
        assert!(provider.tick());
        assert!(provider.tick());

        let samples: Vec<_> = std::iter::from_fn(|| stream.next_update())
            .map(|update| match update {
                PositionUpdate::Sample(s) => s,
                other => panic!("unexpected update {other:?}"),
            })
            .collect();

        let stamps: Vec<i64> = samples.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps, vec![10_000, 11_000, 12_000]);
        for sample in &samples {
            assert!((sample.speed_kmh - 36.0).abs() < 1e-9);
        }
        // 36 km/h is 10 m per second
        let step = samples[0].distance_km(&samples[1]);
        assert!((step - 0.01).abs() < 0.0005, "step was {step}");
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for clamped values"
    )]
    fn speed_is_clamped() {
        let mut provider = SimulatedProvider::new(0.0, 0.0);
        provider.set_speed(-5.0);
        assert_eq!(provider.speed_kmh(), 0.0);
        provider.set_speed(f64::NAN);
        assert_eq!(provider.speed_kmh(), 0.0);
    }

    #[test]
    fn standing_still_does_not_move() {
        let mut provider = SimulatedProvider::new(40.0, -3.0).starting_at(0);
        let _stream = PositionStream::start(&mut provider, &WatchOptions::default()).unwrap();
        provider.tick();
        assert_eq!(provider.position(), (40.0, -3.0));
    }

    #[test]
    fn ticks_stop_after_clear() {
        let mut provider = SimulatedProvider::new(40.0, -3.0)
            .with_speed(10.0)
            .starting_at(0);
        let mut stream = PositionStream::start(&mut provider, &WatchOptions::default()).unwrap();
        stream.stop(&mut provider);
        assert!(!provider.is_watching());
        assert!(!provider.tick());
    }
}

//! Session accumulator: owns the active session and folds samples into it.
//!
//! # Lifecycle
//!
//! The accumulator is either idle or tracking exactly one [`Session`].
//! [`begin_session`](SessionAccumulator::begin_session) starts the position
//! stream and opens a session; [`end_session`](SessionAccumulator::end_session)
//! closes the stream first and then hands back the finished session, so no
//! queued sample can reach it afterwards.
//!
//! Samples are processed one at a time, in arrival order, by
//! [`pump`](SessionAccumulator::pump). Distance comes only from consecutive
//! sample positions, so irregular spacing between fixes is fine.
//!
//! # State
//!
//! UI-facing state is published through [`TrackerSignals`]. Each signal can be
//! read synchronously or subscribed to.

use chrono::Utc;

use crate::error::TrackingError;
use crate::observable::Observable;
use crate::position::{
    LocationProvider, PermissionState, PositionStream, PositionUpdate, SimulatedProvider,
    WatchOptions,
};
use crate::sample::Sample;
use crate::session::{Session, SessionSummary};
use crate::types::SessionId;

/// Observable engine state for the UI layer.
#[derive(Debug)]
pub struct TrackerSignals {
    /// Speed of the latest fix in km/h; 0 while idle or after a fix error.
    pub current_speed_kmh: Observable<f64>,
    pub is_tracking: Observable<bool>,
    /// Running totals of the active session.
    pub active_session: Observable<Option<SessionSummary>>,
    /// Set when location access was refused or revoked.
    pub permission_denied: Observable<bool>,
}

impl Default for TrackerSignals {
    fn default() -> Self {
        Self {
            current_speed_kmh: Observable::new(0.0),
            is_tracking: Observable::new(false),
            active_session: Observable::new(None),
            permission_denied: Observable::new(false),
        }
    }
}

/// Owner of the single active tracking session.
#[derive(Debug)]
pub struct SessionAccumulator<P: LocationProvider> {
    provider: P,
    stream: Option<PositionStream>,
    session: Option<Session>,
    anchor: Option<Sample>,
    revoked: Option<Session>,
    signals: TrackerSignals,
}

impl<P: LocationProvider> SessionAccumulator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            stream: None,
            session: None,
            anchor: None,
            revoked: None,
            signals: TrackerSignals::default(),
        }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub const fn signals(&self) -> &TrackerSignals {
        &self.signals
    }

    pub const fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if any.
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether the provider has finished delivering (or nothing is watching).
    pub fn source_exhausted(&self) -> bool {
        self.stream.as_ref().is_none_or(PositionStream::is_exhausted)
    }

    /// Queries the permission without prompting and publishes the result.
    pub fn check_permission(&mut self) -> PermissionState {
        let state = self.provider.permission();
        self.signals
            .permission_denied
            .set(state == PermissionState::Denied);
        state
    }

    /// Prompts for location permission. Returns whether it was granted.
    pub fn request_permission(&mut self) -> bool {
        let state = self.provider.request_permission();
        tracing::debug!(?state, "permission request finished");
        let granted = state == PermissionState::Granted;
        self.signals.permission_denied.set(!granted);
        granted
    }

    /// Starts a new session at the current time.
    pub fn begin_session(&mut self) -> Result<&Session, TrackingError> {
        self.begin_session_at(Utc::now().timestamp_millis())
    }

    /// Starts a new session at `now_ms`.
    ///
    /// Nothing changes when the position stream cannot start: the error is
    /// returned and the accumulator stays idle.
    pub fn begin_session_at(&mut self, now_ms: i64) -> Result<&Session, TrackingError> {
        if self.session.is_some() {
            return Err(TrackingError::AlreadyActive);
        }

        let stream = match PositionStream::start(&mut self.provider, &WatchOptions::default()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(%err, "could not start tracking");
                if err == TrackingError::PermissionDenied {
                    self.signals.permission_denied.set(true);
                }
                self.signals.is_tracking.set(false);
                return Err(err);
            }
        };

        let session = Session::start(SessionId::generate(), now_ms);
        tracing::debug!(session = %session.id, start = now_ms, "session started");

        self.stream = Some(stream);
        self.anchor = None;
        self.revoked = None;
        self.signals.permission_denied.set(false);
        self.signals.active_session.set(Some(session.summary()));
        self.signals.is_tracking.set(true);

        Ok(self.session.insert(session))
    }

    /// Folds one sample into the active session.
    ///
    /// The first sample of a session only becomes the anchor. Samples that
    /// arrive while idle are ignored and `None` is returned.
    pub fn on_sample(&mut self, sample: Sample) -> Option<&Session> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("ignoring sample while idle");
            return None;
        };

        session.record(sample, self.anchor.as_ref());
        self.anchor = Some(sample);

        self.signals.current_speed_kmh.set(sample.speed_kmh);
        self.signals.active_session.set(Some(session.summary()));
        self.session.as_ref()
    }

    /// Processes every queued stream update. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        self.pump_at(Utc::now().timestamp_millis())
    }

    /// Like [`pump`](Self::pump); `now_ms` stamps a session ended by revocation.
    pub fn pump_at(&mut self, now_ms: i64) -> usize {
        let mut processed = 0;
        while let Some(update) = self.stream.as_mut().and_then(PositionStream::next_update) {
            processed += 1;
            match update {
                PositionUpdate::Sample(sample) => {
                    self.on_sample(sample);
                }
                PositionUpdate::Interrupted(_) => {
                    self.signals.current_speed_kmh.set(0.0);
                }
                PositionUpdate::Revoked => {
                    self.signals.permission_denied.set(true);
                    if let Ok(session) = self.end_session_at(now_ms) {
                        self.revoked = Some(session);
                    }
                    break;
                }
            }
        }
        processed
    }

    /// Takes the session that was ended because permission was revoked.
    pub const fn take_revoked_session(&mut self) -> Option<Session> {
        self.revoked.take()
    }

    /// Stops tracking at the current time and returns the finished session.
    pub fn end_session(&mut self) -> Result<Session, TrackingError> {
        self.end_session_at(Utc::now().timestamp_millis())
    }

    /// Stops tracking at `now_ms` and returns the finished session.
    ///
    /// The stream is closed before anything else, so updates still queued
    /// are dropped. Fails with [`TrackingError::NoActiveSession`] when idle.
    pub fn end_session_at(&mut self, now_ms: i64) -> Result<Session, TrackingError> {
        self.stop_stream();
        let Some(mut session) = self.session.take() else {
            return Err(TrackingError::NoActiveSession);
        };

        session.finish(now_ms.max(session.start_time_ms));
        self.anchor = None;
        self.publish_idle();

        tracing::debug!(
            session = %session.id,
            distance_km = session.total_distance_km,
            samples = session.positions.len(),
            "session ended"
        );
        Ok(session)
    }

    /// Discards the stream, anchor and session regardless of state.
    pub fn reset_state(&mut self) {
        self.stop_stream();
        if let Some(session) = self.session.take() {
            tracing::debug!(session = %session.id, "session discarded by reset");
        }
        self.anchor = None;
        self.revoked = None;
        self.publish_idle();
    }

    fn stop_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop(&mut self.provider);
        }
    }

    fn publish_idle(&self) {
        self.signals.active_session.set(None);
        self.signals.is_tracking.set(false);
        self.signals.current_speed_kmh.set(0.0);
    }
}

impl SessionAccumulator<SimulatedProvider> {
    /// Sets the synthetic target speed and shows it right away.
    pub fn simulate_speed(&mut self, speed_kmh: f64) {
        self.provider.set_speed(speed_kmh);
        self.signals
            .current_speed_kmh
            .set(self.provider.speed_kmh());
    }

    /// Advances the simulation one second and processes the resulting fix.
    pub fn tick(&mut self) -> usize {
        self.provider.tick();
        self.pump()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::position::{PositionError, PositionErrorCode, ReplayEvent, ReplayProvider};
    use crate::sample::RawFix;

    fn fix(lat: f64, lon: f64, speed_mps: f64, ts: i64) -> ReplayEvent {
        ReplayEvent::Fix(RawFix {
            latitude: lat,
            longitude: lon,
            speed_mps: Some(speed_mps),
            timestamp_ms: ts,
        })
    }

    fn live() -> SessionAccumulator<ReplayProvider> {
        SessionAccumulator::new(ReplayProvider::live())
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        assert_eq!(
            acc.begin_session_at(10).unwrap_err(),
            TrackingError::AlreadyActive
        );
        assert!(acc.is_tracking());
    }

    #[test]
    fn end_without_session_is_rejected() {
        let mut acc = live();
        assert_eq!(
            acc.end_session_at(0).unwrap_err(),
            TrackingError::NoActiveSession
        );
    }

    #[test]
    fn two_sample_scenario() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        let kmh = 50.0 / 3.6;
        acc.provider().emit(fix(40.0, -3.0, kmh, 0));
        acc.provider().emit(fix(40.0, -3.001, kmh, 1_000));
        assert_eq!(acc.pump_at(1_000), 2);

        let session = acc.end_session_at(1_000).unwrap();
        assert!(
            (session.total_distance_km - 0.0852).abs() < 0.001,
            "got {}",
            session.total_distance_km
        );
        assert!((session.max_speed_kmh - 50.0).abs() < 1e-9);
        assert_eq!(session.positions.len(), 2);
        assert_eq!(session.end_time_ms, Some(1_000));
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for untouched distance"
    )]
    fn first_sample_is_only_an_anchor() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        let session = acc.on_sample(Sample::new(40.0, -3.0, 30.0, 500)).unwrap();
        assert_eq!(session.total_distance_km, 0.0);
        assert_eq!(session.max_speed_kmh, 0.0);
    }

    #[test]
    fn distance_never_decreases() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        let path = [
            (40.0, -3.0),
            (40.001, -3.0),
            (40.001, -3.0),
            (40.0, -3.0),
            (40.002, -3.002),
            (39.999, -2.999),
        ];
        let mut last = 0.0;
        for (i, (lat, lon)) in path.into_iter().enumerate() {
            let ts = i64::try_from(i).unwrap() * 1_000;
            let total = acc
                .on_sample(Sample::new(lat, lon, 10.0, ts))
                .unwrap()
                .total_distance_km;
            assert!(total >= last, "distance went from {last} to {total}");
            last = total;
        }
        assert!(last > 0.0);
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for empty session"
    )]
    fn ending_without_samples_gives_empty_session() {
        let mut acc = live();
        acc.begin_session_at(1_000).unwrap();
        let session = acc.end_session_at(5_000).unwrap();
        assert_eq!(session.total_distance_km, 0.0);
        assert!(session.positions.is_empty());
        assert_eq!(session.duration_ms(), Some(4_000));
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for anchor-only session"
    )]
    fn new_session_does_not_inherit_anchor() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        acc.on_sample(Sample::new(40.0, -3.0, 10.0, 0));
        acc.end_session_at(1_000).unwrap();

        acc.begin_session_at(2_000).unwrap();
        let session = acc.on_sample(Sample::new(41.0, -3.0, 10.0, 3_000)).unwrap();
        assert_eq!(session.total_distance_km, 0.0);
    }

    #[test]
    fn denied_permission_keeps_tracker_idle() {
        let mut acc =
            SessionAccumulator::new(ReplayProvider::live().with_permission(PermissionState::Denied));
        assert_eq!(
            acc.begin_session_at(0).unwrap_err(),
            TrackingError::PermissionDenied
        );
        assert!(!acc.is_tracking());
        assert!(!acc.signals().is_tracking.get());
        assert!(acc.signals().permission_denied.get());
        assert!(acc.session().is_none());
    }

    #[test]
    fn unsupported_platform_keeps_tracker_idle() {
        let mut acc = SessionAccumulator::new(ReplayProvider::unavailable());
        assert_eq!(
            acc.begin_session_at(0).unwrap_err(),
            TrackingError::Unsupported
        );
        assert!(!acc.signals().is_tracking.get());
        assert!(!acc.signals().permission_denied.get());
    }

    #[test]
    fn granting_permission_after_denial_allows_tracking() {
        let mut acc = SessionAccumulator::new(
            ReplayProvider::live()
                .with_permission(PermissionState::Denied)
                .with_prompt_answer(PermissionState::Granted),
        );
        assert_eq!(acc.check_permission(), PermissionState::Denied);
        assert!(acc.signals().permission_denied.get());

        acc.provider_mut().set_permission(PermissionState::Prompt);
        assert!(acc.request_permission());
        assert!(!acc.signals().permission_denied.get());
        assert!(acc.begin_session_at(0).is_ok());
    }

    #[test]
    fn transient_error_zeroes_speed_but_keeps_tracking() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        acc.provider().emit(fix(40.0, -3.0, 10.0, 0));
        acc.provider().emit(ReplayEvent::Error(PositionError::new(
            PositionErrorCode::PositionUnavailable,
            "lost signal",
        )));
        acc.pump_at(0);

        assert!(acc.is_tracking());
        assert!(acc.signals().current_speed_kmh.get().abs() < f64::EPSILON);
    }

    #[test]
    fn revocation_ends_the_session() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        acc.provider().emit(fix(40.0, -3.0, 10.0, 0));
        acc.provider().emit(fix(40.001, -3.0, 10.0, 1_000));
        acc.provider().emit(ReplayEvent::Error(PositionError::new(
            PositionErrorCode::PermissionDenied,
            "User denied Geolocation",
        )));
        acc.provider().emit(fix(40.002, -3.0, 10.0, 2_000));
        acc.pump_at(1_500);

        assert!(!acc.is_tracking());
        assert!(acc.signals().permission_denied.get());
        assert!(!acc.provider().is_watching());

        let session = acc.take_revoked_session().unwrap();
        assert_eq!(session.positions.len(), 2);
        assert_eq!(session.end_time_ms, Some(1_500));
        assert!(acc.take_revoked_session().is_none());
    }

    #[test]
    fn queued_samples_are_dropped_when_session_ends() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        let late = acc.provider().sink().unwrap();
        acc.provider().emit(fix(40.0, -3.0, 10.0, 0));
        acc.provider().emit(fix(40.01, -3.0, 10.0, 1_000));

        let session = acc.end_session_at(2_000).unwrap();
        assert!(session.positions.is_empty());

        acc.begin_session_at(3_000).unwrap();
        late.fix(RawFix {
            latitude: 50.0,
            longitude: 0.0,
            speed_mps: None,
            timestamp_ms: 3_500,
        });
        assert_eq!(acc.pump_at(4_000), 0);
        assert!(acc.session().unwrap().positions.is_empty());
    }

    #[test]
    fn source_is_exhausted_once_a_script_drains() {
        let mut acc = SessionAccumulator::new(ReplayProvider::from_events(vec![
            fix(40.0, -3.0, 10.0, 0),
            fix(40.001, -3.0, 10.0, 1_000),
        ]));
        assert!(acc.source_exhausted());

        acc.begin_session_at(0).unwrap();
        assert!(!acc.source_exhausted());
        assert_eq!(acc.pump_at(1_000), 2);
        assert!(acc.source_exhausted());
        assert!(acc.is_tracking());
    }

    #[test]
    fn live_source_is_never_exhausted_while_watching() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        acc.provider().emit(fix(40.0, -3.0, 10.0, 0));
        acc.pump_at(0);
        assert!(!acc.source_exhausted());

        acc.end_session_at(1_000).unwrap();
        assert!(acc.source_exhausted());
    }

    #[test]
    fn samples_while_idle_are_ignored() {
        let mut acc = live();
        assert!(acc.on_sample(Sample::new(1.0, 1.0, 1.0, 0)).is_none());
        assert!(!acc.signals().is_tracking.get());
    }

    #[test]
    fn reset_discards_everything() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        acc.on_sample(Sample::new(40.0, -3.0, 10.0, 0));
        acc.reset_state();

        assert!(!acc.is_tracking());
        assert!(!acc.provider().is_watching());
        assert!(acc.signals().active_session.get().is_none());

        // Reset also forgets the anchor.
        acc.begin_session_at(1_000).unwrap();
        let session = acc.on_sample(Sample::new(41.0, -3.0, 10.0, 2_000)).unwrap();
        assert!(session.total_distance_km.abs() < f64::EPSILON);
    }

    #[test]
    fn subscribers_follow_the_lifecycle() {
        let mut acc = live();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let _sub = acc
            .signals()
            .is_tracking
            .subscribe(move |tracking| sink.borrow_mut().push(*tracking));

        acc.begin_session_at(0).unwrap();
        acc.end_session_at(1_000).unwrap();

        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[test]
    fn active_session_signal_tracks_totals() {
        let mut acc = live();
        acc.begin_session_at(0).unwrap();
        acc.on_sample(Sample::new(40.0, -3.0, 10.0, 0));
        acc.on_sample(Sample::new(40.001, -3.0, 12.0, 1_000));

        let summary = acc.signals().active_session.get().unwrap();
        assert_eq!(summary.sample_count, 2);
        assert!(summary.total_distance_km > 0.1);
        assert!((acc.signals().current_speed_kmh.get() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn synthetic_distance_matches_target_speed() {
        for (speed, seconds) in [(60.0, 30), (30.0, 10), (90.0, 3), (5.0, 120)] {
            let provider = SimulatedProvider::new(40.4168, -3.7038)
                .with_speed(speed)
                .starting_at(0);
            let mut acc = SessionAccumulator::new(provider);
            acc.begin_session_at(0).unwrap();
            acc.pump_at(0);
            for _ in 0..seconds {
                acc.tick();
            }
            let session = acc.end_session_at(i64::from(seconds) * 1_000).unwrap();

            let expected = speed / 3600.0 * f64::from(seconds);
            let actual = session.total_distance_km;
            assert!(
                actual >= expected * 0.8 && actual <= expected * 1.2,
                "{speed} km/h for {seconds}s: expected ~{expected}, got {actual}"
            );
            assert!((session.average_speed_kmh - speed).abs() < speed * 0.2);
        }
    }

    #[test]
    fn simulate_speed_publishes_immediately() {
        let mut acc = SessionAccumulator::new(SimulatedProvider::new(40.0, -3.0).starting_at(0));
        acc.begin_session_at(0).unwrap();
        acc.simulate_speed(60.0);
        assert!((acc.signals().current_speed_kmh.get() - 60.0).abs() < f64::EPSILON);

        acc.simulate_speed(0.0);
        acc.tick();
        acc.tick();
        let session = acc.end_session_at(2_000).unwrap();
        assert!(session.total_distance_km.abs() < f64::EPSILON);
    }
}

//! Position stream adapter.
//!
//! A [`LocationProvider`] is the platform's continuous-location capability.
//! Providers push raw events into a [`FixSink`]; a [`PositionStream`] owns the
//! receiving end and turns those events into normalized [`PositionUpdate`]s.
//!
//! Events are queued on a channel, so providers may call back from any thread.
//! Stopping the stream drops the receiver: anything a provider delivers after
//! that is discarded instead of reaching a finished session.

pub mod replay;
pub mod simulated;

use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::TrackingError;
use crate::sample::{RawFix, Sample};
use crate::types::ValidationError;

pub use replay::{ReplayError, ReplayEvent, ReplayProvider};
pub use simulated::SimulatedProvider;

/// Result of a one-shot permission query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; the platform asks the user when watching starts.
    Prompt,
}

impl PermissionState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PermissionState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "prompt" => Ok(Self::Prompt),
            _ => Err(ValidationError::InvalidPermission {
                value: s.to_string(),
            }),
        }
    }
}

/// Options forwarded to the platform when watching starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    /// Maximum wait for a fix before the platform reports a timeout.
    pub timeout_ms: u32,
    /// Maximum age of a cached fix the platform may return.
    pub maximum_age_ms: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 5_000,
            maximum_age_ms: 1_000,
        }
    }
}

/// Handle of an active platform watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

/// Category of a per-fix platform error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

impl fmt::Display for PositionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PermissionDenied => "permission denied",
            Self::PositionUnavailable => "position unavailable",
            Self::Timeout => "timeout",
        })
    }
}

/// An error reported by the platform instead of a fix.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    #[serde(default)]
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A raw platform callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(RawFix),
    Error(PositionError),
}

/// Sending half handed to a provider when watching starts.
#[derive(Debug, Clone)]
pub struct FixSink {
    tx: Sender<PositionEvent>,
}

impl FixSink {
    /// Delivers a fix. Returns `false` once the stream has been stopped.
    pub fn fix(&self, fix: RawFix) -> bool {
        self.tx.send(PositionEvent::Fix(fix)).is_ok()
    }

    /// Delivers an error. Returns `false` once the stream has been stopped.
    pub fn error(&self, error: PositionError) -> bool {
        self.tx.send(PositionEvent::Error(error)).is_ok()
    }
}

/// The platform's continuous-location capability.
pub trait LocationProvider {
    /// Whether the platform can deliver locations at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Queries the current permission without prompting.
    fn permission(&self) -> PermissionState;

    /// Prompts the user (where the platform supports it) and returns the outcome.
    fn request_permission(&mut self) -> PermissionState;

    /// Starts delivering events into `sink` until [`clear_watch`](Self::clear_watch).
    fn watch(&mut self, sink: FixSink, options: &WatchOptions) -> Result<WatchId, TrackingError>;

    /// Cancels a watch. Unknown IDs are ignored.
    fn clear_watch(&mut self, id: WatchId);
}

/// A normalized item produced by a [`PositionStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum PositionUpdate {
    /// A position with speed converted to km/h.
    Sample(Sample),
    /// A transient platform error; speed should read as 0 until the next fix.
    Interrupted(PositionError),
    /// Permission was revoked mid-stream. The stream is closed.
    Revoked,
}

/// Live sequence of normalized samples from one provider watch.
#[derive(Debug)]
pub struct PositionStream {
    receiver: Option<Receiver<PositionEvent>>,
    watch: Option<WatchId>,
    source_finished: bool,
}

impl PositionStream {
    /// Starts watching `provider`.
    ///
    /// Fails with [`TrackingError::Unsupported`] when the provider has no
    /// location capability and [`TrackingError::PermissionDenied`] when the
    /// permission query comes back denied.
    pub fn start<P>(provider: &mut P, options: &WatchOptions) -> Result<Self, TrackingError>
    where
        P: LocationProvider + ?Sized,
    {
        if !provider.is_available() {
            return Err(TrackingError::Unsupported);
        }
        if provider.permission() == PermissionState::Denied {
            return Err(TrackingError::PermissionDenied);
        }

        let (tx, rx) = mpsc::channel();
        let watch = provider.watch(FixSink { tx }, options)?;
        tracing::debug!(watch = watch.0, "position watch started");

        Ok(Self {
            receiver: Some(rx),
            watch: Some(watch),
            source_finished: false,
        })
    }

    /// Whether the stream still accepts events.
    pub const fn is_open(&self) -> bool {
        self.receiver.is_some()
    }

    /// Whether the provider has dropped every sink and the queue is drained.
    pub const fn is_exhausted(&self) -> bool {
        self.source_finished || self.receiver.is_none()
    }

    /// Takes the next queued update without blocking.
    pub fn next_update(&mut self) -> Option<PositionUpdate> {
        let receiver = self.receiver.as_ref()?;
        let event = match receiver.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                self.source_finished = true;
                return None;
            }
        };

        match event {
            PositionEvent::Fix(fix) => Some(PositionUpdate::Sample(Sample::from(fix))),
            PositionEvent::Error(error) if error.code == PositionErrorCode::PermissionDenied => {
                tracing::warn!(%error, "location permission revoked, closing position stream");
                self.receiver = None;
                Some(PositionUpdate::Revoked)
            }
            PositionEvent::Error(error) => {
                tracing::warn!(%error, "transient position error");
                Some(PositionUpdate::Interrupted(error))
            }
        }
    }

    /// Cancels the platform watch and closes the channel. Idempotent.
    pub fn stop<P>(&mut self, provider: &mut P)
    where
        P: LocationProvider + ?Sized,
    {
        self.receiver = None;
        if let Some(watch) = self.watch.take() {
            provider.clear_watch(watch);
            tracing::debug!(watch = watch.0, "position watch cleared");
        }
    }
}

//! Tracking errors.

use thiserror::Error;

/// Failures of the tracking lifecycle.
///
/// None of these are fatal: the worst outcome is an idle tracker that the
/// caller can retry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TrackingError {
    /// Location access was refused or revoked. Retryable after the user
    /// grants permission.
    #[error("location permission denied")]
    PermissionDenied,
    /// The platform has no location capability. Not retryable.
    #[error("location services are not supported on this platform")]
    Unsupported,
    /// `begin_session` was called while a session was running.
    #[error("a tracking session is already active")]
    AlreadyActive,
    /// `end_session` was called with no running session.
    #[error("no tracking session is active")]
    NoActiveSession,
}

impl TrackingError {
    /// Whether asking again (e.g. after a permission prompt) may succeed.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

//! Core tracking engine for kmtrack.
//!
//! This crate contains:
//! - Position stream adapter: platform location providers, including a
//!   synthetic one, normalized into samples
//! - Session accumulator: the single active session and its running
//!   distance, speed and duration
//! - Trip entry types shared with the ledger

pub mod accumulator;
pub mod error;
pub mod geo;
pub mod observable;
pub mod position;
pub mod sample;
pub mod session;
pub mod trip;
pub mod types;

pub use accumulator::{SessionAccumulator, TrackerSignals};
pub use error::TrackingError;
pub use observable::{Observable, Subscription};
pub use position::{
    LocationProvider, PermissionState, PositionStream, PositionUpdate, ReplayProvider,
    SimulatedProvider, WatchOptions,
};
pub use sample::{RawFix, Sample};
pub use session::{Session, SessionSummary};
pub use trip::{ActivityType, NewTripEntry, TripEntry, TripEntryUpdate, format_duration};
pub use types::{SessionId, TripId, ValidationError};

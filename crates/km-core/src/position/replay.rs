//! Scripted location provider.
//!
//! Replays recorded platform callbacks (fixes and errors) through the normal
//! stream pipeline. Scripts are JSON lines:
//!
//! ```text
//! {"type":"fix","latitude":40.0,"longitude":-3.0,"speed_mps":13.9,"timestamp_ms":1738144800000}
//! {"type":"error","code":"timeout","message":"no fix within 5s"}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FixSink, LocationProvider, PermissionState, PositionError, WatchId, WatchOptions};
use crate::error::TrackingError;
use crate::sample::RawFix;

/// One recorded platform callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Fix(RawFix),
    Error(PositionError),
}

/// Errors from reading a replay script.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("invalid replay event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A provider that delivers a fixed script, optionally staying open for more.
#[derive(Debug)]
pub struct ReplayProvider {
    script: Vec<ReplayEvent>,
    available: bool,
    permission: PermissionState,
    /// Outcome of the next permission prompt.
    prompt_answer: PermissionState,
    keep_open: bool,
    sink: Option<FixSink>,
    watch: Option<WatchId>,
    next_watch: u32,
    cleared: usize,
}

impl ReplayProvider {
    /// Delivers `events` as soon as watching starts, then closes the source.
    pub fn from_events(events: Vec<ReplayEvent>) -> Self {
        Self {
            script: events,
            available: true,
            permission: PermissionState::Granted,
            prompt_answer: PermissionState::Granted,
            keep_open: false,
            sink: None,
            watch: None,
            next_watch: 1,
            cleared: 0,
        }
    }

    /// A provider with no script that stays open; feed it with [`emit`](Self::emit).
    pub fn live() -> Self {
        Self {
            keep_open: true,
            ..Self::from_events(Vec::new())
        }
    }

    /// A platform without any location capability.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::from_events(Vec::new())
        }
    }

    /// Parses a JSON-lines script. Blank lines are skipped.
    pub fn parse_script(content: &str) -> Result<Vec<ReplayEvent>, ReplayError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }

    #[must_use]
    pub const fn with_permission(mut self, permission: PermissionState) -> Self {
        self.permission = permission;
        self
    }

    /// Sets what a permission prompt resolves to.
    #[must_use]
    pub const fn with_prompt_answer(mut self, answer: PermissionState) -> Self {
        self.prompt_answer = answer;
        self
    }

    /// Pushes one more event into the active watch.
    ///
    /// Returns `false` when nothing is watching or the stream was stopped.
    pub fn emit(&self, event: ReplayEvent) -> bool {
        self.sink.as_ref().is_some_and(|sink| deliver(sink, event))
    }

    /// A clone of the active sink, as a platform callback would hold it.
    pub fn sink(&self) -> Option<FixSink> {
        self.sink.clone()
    }

    pub const fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// How many watches have been cleared so far.
    pub const fn cleared_watches(&self) -> usize {
        self.cleared
    }

    /// Changes the permission as if the user edited it in system settings.
    pub const fn set_permission(&mut self, permission: PermissionState) {
        self.permission = permission;
    }
}

fn deliver(sink: &FixSink, event: ReplayEvent) -> bool {
    match event {
        ReplayEvent::Fix(fix) => sink.fix(fix),
        ReplayEvent::Error(error) => sink.error(error),
    }
}

impl LocationProvider for ReplayProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    fn permission(&self) -> PermissionState {
        self.permission
    }

    fn request_permission(&mut self) -> PermissionState {
        if self.permission == PermissionState::Granted {
            return self.permission;
        }
        self.permission = self.prompt_answer;
        self.permission
    }

    fn watch(&mut self, sink: FixSink, _options: &WatchOptions) -> Result<WatchId, TrackingError> {
        if !self.available {
            return Err(TrackingError::Unsupported);
        }
        if self.permission == PermissionState::Prompt {
            self.permission = self.prompt_answer;
        }
        if self.permission == PermissionState::Denied {
            return Err(TrackingError::PermissionDenied);
        }

        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watch = Some(id);

        for event in self.script.drain(..) {
            deliver(&sink, event);
        }
        if self.keep_open {
            self.sink = Some(sink);
        }
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.watch == Some(id) {
            self.watch = None;
            self.sink = None;
            self.cleared += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionErrorCode;

    #[test]
    fn parses_fix_and_error_lines() {
        let script = r#"
{"type":"fix","latitude":40.0,"longitude":-3.0,"speed_mps":13.9,"timestamp_ms":0}

{"type":"error","code":"timeout","message":"no fix"}
{"type":"fix","latitude":40.0,"longitude":-3.001,"timestamp_ms":1000}
"#;
        let events = ReplayProvider::parse_script(script).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            ReplayEvent::Error(e) if e.code == PositionErrorCode::Timeout
        ));
        assert!(matches!(&events[2], ReplayEvent::Fix(f) if f.speed_mps.is_none()));
    }

    #[test]
    fn parse_error_reports_line_number() {
        let script = "{\"type\":\"fix\",\"latitude\":1,\"longitude\":2,\"timestamp_ms\":0}\n{\"type\":\"teleport\"}\n";
        let err = ReplayProvider::parse_script(script).unwrap_err();
        assert!(err.to_string().starts_with("invalid replay event on line 2"));
    }

    #[test]
    fn prompt_resolves_to_configured_answer() {
        let mut provider = ReplayProvider::live()
            .with_permission(PermissionState::Prompt)
            .with_prompt_answer(PermissionState::Denied);
        assert_eq!(provider.request_permission(), PermissionState::Denied);
        assert_eq!(provider.permission(), PermissionState::Denied);
    }

    #[test]
    fn emit_without_watch_is_dropped() {
        let provider = ReplayProvider::live();
        let fix = RawFix {
            latitude: 0.0,
            longitude: 0.0,
            speed_mps: None,
            timestamp_ms: 0,
        };
        assert!(!provider.emit(ReplayEvent::Fix(fix)));
    }
}

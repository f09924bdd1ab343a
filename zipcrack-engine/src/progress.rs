//! Progress reporting.
//!
//! A dedicated task samples the shared state every 500 ms and pushes a
//! [`Snapshot`] onto the observer channel. It never blocks workers and never
//! blocks itself on a slow observer: when the channel is full the snapshot is
//! dropped, and when the observer has gone away entirely the reporter poisons
//! the search so every worker drains.

use crate::shared::SearchState;
use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use zipcrack_core::CrackError;

/// Snapshot cadence. Fixed; no backoff.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Which stage of the search a snapshot was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Custom words and the embedded corpus.
    Dictionary,
    /// Brute-force enumeration.
    Running,
    /// Terminal: the password was recovered.
    Done,
    /// Terminal: the search failed.
    Error,
}

impl Phase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Dictionary,
            1 => Self::Running,
            2 => Self::Done,
            _ => Self::Error,
        }
    }
}

/// One progress observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Candidates tested so far; non-decreasing across snapshots.
    pub attempts: u64,
    /// Seconds since the invocation started.
    pub elapsed_seconds: f64,
    /// Average testing rate since the start.
    pub passwords_per_second: f64,
    /// The most recently sampled candidate (possibly slightly stale), or the
    /// recovered password / error token in a terminal snapshot.
    pub current_password: String,
    /// Search stage.
    pub phase: Phase,
}

/// Everything the observer stream carries.
#[derive(Debug)]
pub enum CrackEvent {
    /// A periodic progress snapshot.
    Progress(Snapshot),
    /// The terminal result; exactly one per invocation, always last.
    Finished(Result<String, CrackError>),
}

/// Reporter loop. Runs on its own thread until the search finds a witness,
/// the driver marks the search done, or the observer detaches.
pub(crate) fn run_reporter(state: &SearchState, events: &Sender<CrackEvent>) {
    loop {
        thread::sleep(REPORT_INTERVAL);
        if state.found() || state.done() {
            return;
        }
        match events.try_send(CrackEvent::Progress(state.snapshot())) {
            Ok(()) => {}
            // Slow observer: drop this snapshot, keep the cadence.
            Err(TrySendError::Full(_)) => {}
            // Observer detached: cancel the whole invocation.
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("observer detached, poisoning search");
                state.poison();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_u8_roundtrip() {
        for phase in [Phase::Dictionary, Phase::Running, Phase::Done, Phase::Error] {
            assert_eq!(Phase::from_u8(phase as u8), phase);
        }
    }

    #[test]
    fn test_reporter_exits_on_detach() {
        let state = std::sync::Arc::new(SearchState::new(Phase::Running));
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);

        let reporter_state = std::sync::Arc::clone(&state);
        let handle = thread::spawn(move || run_reporter(&reporter_state, &tx));
        handle.join().expect("reporter thread");

        assert!(state.cancelled());
        assert!(state.found(), "poison raises the found flag");
    }

    #[test]
    fn test_reporter_exits_when_done() {
        let state = std::sync::Arc::new(SearchState::new(Phase::Running));
        let (tx, _rx) = crossbeam_channel::bounded(4);
        state.mark_done();

        let reporter_state = std::sync::Arc::clone(&state);
        let handle = thread::spawn(move || run_reporter(&reporter_state, &tx));
        handle.join().expect("reporter thread");
        assert!(!state.cancelled());
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = Snapshot {
            attempts: 42,
            elapsed_seconds: 1.5,
            passwords_per_second: 28.0,
            current_password: "abc".into(),
            phase: Phase::Running,
        };
        let json = serde_json::to_string(&snap).expect("serialize");
        assert!(json.contains("\"attempts\":42"));
        assert!(json.contains("Running"));
    }
}

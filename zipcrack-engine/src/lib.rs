//! # Zipcrack Engine
//!
//! Recovery engine for ZIP archives protected by the traditional PKWARE
//! stream cipher ("ZipCrypto").
//!
//! Given the archive bytes and a [`CrackConfig`], the engine locates the
//! first encrypted local-file-header record, then pushes candidates through
//! a two-phase validator: a keystream pre-check that rejects ~255/256 of
//! wrong passwords in a few nanoseconds, and a CRC-verified decompression
//! that confirms the survivors. Candidates come from the caller's custom
//! words, an embedded common-password corpus, and base-|Σ| brute-force
//! enumeration fanned out across every core.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ API        crack / test_single / estimate / set_paused   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Search     scheduler (rayon find-any) · progress reporter│
//! ├──────────────────────────────────────────────────────────┤
//! │ Candidates charset enumerator · dictionary slabs         │
//! ├──────────────────────────────────────────────────────────┤
//! │ Archive    locator · fast + full validators              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use zipcrack_engine::{CrackConfig, CrackEvent, crack};
//!
//! let archive = std::fs::read("locked.zip").unwrap();
//! let handle = crack(archive, CrackConfig::default()).unwrap();
//! for event in handle.events().iter() {
//!     match event {
//!         CrackEvent::Progress(snap) => {
//!             eprintln!("{} tried, {:.0}/s", snap.attempts, snap.passwords_per_second);
//!         }
//!         CrackEvent::Finished(result) => {
//!             println!("{result:?}");
//!             break;
//!         }
//!     }
//! }
//! ```

#![warn(clippy::all)]

pub mod charset;
pub mod config;
pub mod dictionary;
pub mod estimate;
pub mod locator;
pub mod progress;
pub mod validate;

mod scheduler;
mod shared;

pub use config::CrackConfig;
pub use estimate::estimate;
pub use progress::{CrackEvent, Phase, REPORT_INTERVAL, Snapshot};
pub use shared::{is_paused, set_paused};
pub use zipcrack_core::{CrackError, Result};

use crate::charset::Charset;
use crate::shared::SearchState;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Capacity of the observer channel; snapshots beyond it are dropped.
const EVENT_CHANNEL_CAP: usize = 32;

/// A running recovery invocation.
///
/// Holds the receiving end of the observer stream: periodic
/// [`CrackEvent::Progress`] snapshots followed by exactly one
/// [`CrackEvent::Finished`]. Dropping the handle (or the receiver taken from
/// it) detaches the observer, which cancels the search; the workers drain
/// within one reporter cadence plus one inner-loop batch.
#[derive(Debug)]
pub struct CrackHandle {
    events: Receiver<CrackEvent>,
}

impl CrackHandle {
    /// The observer stream.
    #[must_use]
    pub fn events(&self) -> &Receiver<CrackEvent> {
        &self.events
    }

    /// Take ownership of the observer stream.
    #[must_use]
    pub fn into_events(self) -> Receiver<CrackEvent> {
        self.events
    }

    /// Block until the terminal result, discarding progress snapshots.
    pub fn wait(self) -> Result<String> {
        for event in self.events.iter() {
            if let CrackEvent::Finished(result) = event {
                return result;
            }
        }
        // The channel closed without a terminal event; only a panicked
        // driver can cause this.
        Err(CrackError::Cancelled)
    }
}

/// Start a recovery invocation.
///
/// Configuration and archive-shape problems are reported synchronously
/// before any worker starts: [`CrackError::InvalidConfig`],
/// [`CrackError::NoEncryptedEntry`], [`CrackError::UnsupportedEncryption`],
/// [`CrackError::UnsupportedCompression`], [`CrackError::TruncatedArchive`].
/// Everything after that arrives on the returned handle's stream.
pub fn crack(archive: Vec<u8>, config: CrackConfig) -> Result<CrackHandle> {
    config.validate()?;
    let entry = locator::locate(&archive)?;
    let charset = Charset::from_config(&config);

    let initial_phase = if !config.custom_words.is_empty() || config.use_dictionary {
        Phase::Dictionary
    } else {
        Phase::Running
    };
    let state = Arc::new(SearchState::new(initial_phase));
    let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_CHANNEL_CAP);

    let reporter_state = Arc::clone(&state);
    let reporter_tx = events_tx.clone();
    let reporter = thread::Builder::new()
        .name("zipcrack-reporter".into())
        .spawn(move || progress::run_reporter(&reporter_state, &reporter_tx))
        .expect("spawn reporter thread");

    thread::Builder::new()
        .name("zipcrack-driver".into())
        .spawn(move || {
            debug!(
                archive_len = archive.len(),
                method = ?entry.method,
                check = ?entry.check_source,
                "search starting"
            );
            let winner = scheduler::run_search(&archive, &entry, &config, &charset, &state);
            state.mark_done();
            // The reporter wakes within one cadence and exits; joining it
            // keeps the terminal events strictly last on the stream.
            let _ = reporter.join();

            let result = match winner {
                Some(password) => Ok(String::from_utf8_lossy(&password).into_owned()),
                None if state.cancelled() => Err(CrackError::Cancelled),
                None => Err(CrackError::NotFound),
            };

            let mut final_snapshot = state.snapshot();
            match &result {
                Ok(password) => {
                    final_snapshot.phase = Phase::Done;
                    final_snapshot.current_password = password.clone();
                }
                Err(err) => {
                    final_snapshot.phase = Phase::Error;
                    final_snapshot.current_password = err.token().into();
                }
            }
            // A full channel may cost us the final snapshot, never the
            // terminal result.
            let _ = events_tx.try_send(CrackEvent::Progress(final_snapshot));
            let _ = events_tx.send(CrackEvent::Finished(result));
        })
        .expect("spawn driver thread");

    Ok(CrackHandle { events: events_rx })
}

/// Test one candidate against the archive's first encrypted entry.
///
/// Runs the fast pre-check and, on a pass, the authoritative CRC-verified
/// decompression. Archive-shape errors are the same as [`crack`]'s.
pub fn test_single(archive: &[u8], password: &[u8]) -> Result<bool> {
    let entry = locator::locate(archive)?;
    Ok(validate::test_candidate(&entry, archive, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crack_rejects_invalid_config_synchronously() {
        let config = CrackConfig {
            min_length: 4,
            max_length: 2,
            ..CrackConfig::default()
        };
        assert!(matches!(
            crack(vec![0; 64], config),
            Err(CrackError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_crack_rejects_garbage_archive_synchronously() {
        assert!(matches!(
            crack(b"definitely not a zip".to_vec(), CrackConfig::default()),
            Err(CrackError::NoEncryptedEntry)
        ));
    }

    #[test]
    fn test_test_single_propagates_locator_errors() {
        assert!(matches!(
            test_single(b"", b"pw"),
            Err(CrackError::NoEncryptedEntry)
        ));
    }
}

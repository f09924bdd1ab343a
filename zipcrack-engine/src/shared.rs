//! Shared coordination state.
//!
//! One [`SearchState`] exists per invocation and is the only thing workers,
//! the reporter, and the driver share. Everything is relaxed atomics: the
//! engine does not need happens-before edges between candidates, only the
//! bounded propagation of `found` that the per-batch check provides. The one
//! exception is the claim CAS, whose release/acquire pairing publishes the
//! winner bytes to whichever thread reads them.
//!
//! The pause flag is process-wide by contract: a single toggle that outlives
//! any particular invocation.

use crate::progress::{Phase, Snapshot};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Workers touch the shared state once per this many candidates.
pub(crate) const BATCH: u64 = 16_384;

/// Power-of-two mask for the batch check.
pub(crate) const BATCH_MASK: u64 = BATCH - 1;

/// How long a paused worker sleeps between flag polls.
const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Sample buffer capacity; candidates are at most 16 bytes anyway.
const SAMPLE_CAP: usize = 16;

static PAUSED: AtomicBool = AtomicBool::new(false);

/// Set or clear the process-wide pause flag. Idempotent; visible to every
/// worker within one pause-poll interval (50 ms).
pub fn set_paused(paused: bool) {
    PAUSED.store(paused, Ordering::Relaxed);
}

/// Read the process-wide pause flag.
#[must_use]
pub fn is_paused() -> bool {
    PAUSED.load(Ordering::Relaxed)
}

/// Fixed-size copy of the most recently sampled candidate.
#[derive(Default)]
struct SampleBuf {
    len: u8,
    bytes: [u8; SAMPLE_CAP],
}

/// Coordination state shared across one invocation.
pub(crate) struct SearchState {
    attempts: AtomicU64,
    found: AtomicBool,
    cancelled: AtomicBool,
    done: AtomicBool,
    phase: AtomicU8,
    sample: Mutex<SampleBuf>,
    winner: Mutex<Option<Vec<u8>>>,
    started: Instant,
}

impl SearchState {
    pub(crate) fn new(initial_phase: Phase) -> Self {
        Self {
            attempts: AtomicU64::new(0),
            found: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            done: AtomicBool::new(false),
            phase: AtomicU8::new(initial_phase as u8),
            sample: Mutex::new(SampleBuf::default()),
            winner: Mutex::new(None),
            started: Instant::now(),
        }
    }

    /// Fold a worker's local batch count into the global counter.
    #[inline]
    pub(crate) fn add_attempts(&self, n: u64) {
        if n > 0 {
            self.attempts.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Whether some worker has confirmed a password (or the search was
    /// poisoned). Workers poll this once per batch.
    #[inline]
    pub(crate) fn found(&self) -> bool {
        self.found.load(Ordering::Relaxed)
    }

    /// Claim victory for `password`. Only the first confirming worker wins;
    /// the CAS makes the store of the winner bytes visible to the reader.
    pub(crate) fn try_claim(&self, password: &[u8]) -> bool {
        if self
            .found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            *self.winner.lock().expect("winner lock") = Some(password.to_vec());
            true
        } else {
            false
        }
    }

    /// Observer detached: raise `found` as a poison so workers drain, and
    /// remember that the exit reason is cancellation, not a witness.
    pub(crate) fn poison(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.found.store(true, Ordering::Relaxed);
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// The driver marks the search complete so the reporter can exit even
    /// when no password was found.
    pub(crate) fn mark_done(&self) {
        self.done.store(true, Ordering::Relaxed);
    }

    pub(crate) fn done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
    }

    pub(crate) fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    /// Overwrite the sampled candidate. Called once per batch, outside the
    /// inner loop, so the lock never contends with candidate testing.
    pub(crate) fn record_sample(&self, candidate: &[u8]) {
        let mut sample = self.sample.lock().expect("sample lock");
        let n = candidate.len().min(SAMPLE_CAP);
        sample.bytes[..n].copy_from_slice(&candidate[..n]);
        sample.len = n as u8;
    }

    fn sample_string(&self) -> String {
        let sample = self.sample.lock().expect("sample lock");
        String::from_utf8_lossy(&sample.bytes[..sample.len as usize]).into_owned()
    }

    /// Honor the process-wide pause flag: spin in 50 ms sleeps until the
    /// flag clears or the search is shutting down.
    pub(crate) fn wait_while_paused(&self) {
        while is_paused() && !self.found() {
            thread::sleep(PAUSE_POLL);
        }
    }

    pub(crate) fn take_winner(&self) -> Option<Vec<u8>> {
        self.winner.lock().expect("winner lock").take()
    }

    /// Materialize a progress snapshot from the current counters.
    pub(crate) fn snapshot(&self) -> Snapshot {
        let attempts = self.attempts();
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            attempts as f64 / elapsed
        } else {
            0.0
        };
        Snapshot {
            attempts,
            elapsed_seconds: elapsed,
            passwords_per_second: rate,
            current_password: self.sample_string(),
            phase: self.phase(),
        }
    }
}

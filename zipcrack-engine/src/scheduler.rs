//! Work scheduler.
//!
//! Drives the three search phases in order: custom words, the embedded
//! corpus, then brute force over each configured length. The dictionary and
//! brute-force phases fan out on the rayon pool; brute force splits each
//! per-length ordinal space into 2^16-candidate chunks and runs a
//! data-parallel find-any over the chunk index space, so work stealing comes
//! from the pool rather than a bespoke queue.
//!
//! The inner loop touches shared state only once per 16 384-candidate batch:
//! it flushes the local attempt count, refreshes the sampled candidate,
//! honors the pause flag, and observes `found`. That check is what bounds
//! how long any worker can keep testing after a witness is confirmed.

use crate::charset::{Candidate, Charset};
use crate::config::CrackConfig;
use crate::dictionary;
use crate::locator::EncryptedEntry;
use crate::progress::Phase;
use crate::shared::{BATCH_MASK, SearchState};
use crate::validate;
use rayon::prelude::*;
use tracing::{debug, info};

/// Ordinals per brute-force chunk.
const CHUNK: u64 = 1 << 16;

/// Run the full search. Returns the confirmed password, or `None` when every
/// configured candidate was exhausted (or the search was poisoned).
pub(crate) fn run_search(
    archive: &[u8],
    entry: &EncryptedEntry,
    config: &CrackConfig,
    charset: &Charset,
    state: &SearchState,
) -> Option<Vec<u8>> {
    state.set_phase(Phase::Dictionary);

    scan_custom_words(archive, entry, config, state);

    if config.use_dictionary && !state.found() {
        debug!("scanning embedded corpus");
        let max_len = config.max_length as usize;
        dictionary::corpus_slabs(dictionary::EMBEDDED_CORPUS)
            .par_iter()
            .find_map_any(|slab| scan_slab(archive, entry, slab, max_len, state));
    }

    if !charset.is_empty() && !state.found() {
        state.set_phase(Phase::Running);
        for len in config.min_length..=config.max_length {
            if state.found() {
                break;
            }
            let total = charset.space_size(len);
            let num_chunks = total.div_ceil(CHUNK);
            debug!(len, total, num_chunks, "brute force pass");

            // find_map_any stops handing out chunk indices once any worker
            // reports the stop condition; chunks already running drain at
            // their next batch check.
            (0..num_chunks).into_par_iter().find_map_any(|chunk_index| {
                let start = chunk_index * CHUNK;
                let end = start.saturating_add(CHUNK).min(total);
                scan_chunk(archive, entry, charset, state, start, end, len as usize)
            });
        }
    }

    match state.take_winner() {
        Some(password) => {
            info!(len = password.len(), "password confirmed");
            Some(password)
        }
        None => {
            debug!(attempts = state.attempts(), "search space exhausted");
            None
        }
    }
}

/// Phase 1: the user's own words, in order. The list is small, so this runs
/// sequentially and counts every attempt immediately.
fn scan_custom_words(
    archive: &[u8],
    entry: &EncryptedEntry,
    config: &CrackConfig,
    state: &SearchState,
) {
    for word in &config.custom_words {
        if state.found() {
            return;
        }
        state.wait_while_paused();
        let candidate = word.as_bytes();
        if candidate.is_empty() {
            continue;
        }
        state.record_sample(candidate);
        state.add_attempts(1);
        if validate::test_candidate(entry, archive, candidate) {
            state.try_claim(candidate);
            return;
        }
    }
}

/// Phase 2 worker: scan one corpus slab sequentially.
///
/// Returns `Some(())` when the shutdown condition was observed, whether a
/// witness (ours or another worker's) or a poison, so the enclosing find-any
/// stops handing out slabs. The witness itself lives in the shared state.
fn scan_slab(
    archive: &[u8],
    entry: &EncryptedEntry,
    slab: &str,
    max_len: usize,
    state: &SearchState,
) -> Option<()> {
    let mut pending = 0u64;
    for (i, candidate) in dictionary::candidates(slab, max_len).enumerate() {
        if i as u64 & BATCH_MASK == 0 {
            state.add_attempts(pending);
            pending = 0;
            if state.found() {
                return Some(());
            }
            state.wait_while_paused();
            state.record_sample(candidate);
        }
        pending += 1;
        if validate::test_candidate(entry, archive, candidate) {
            state.add_attempts(pending);
            state.try_claim(candidate);
            return Some(());
        }
    }
    state.add_attempts(pending);
    None
}

/// Phase 3 worker: test ordinals `start..end` of the length-`len` space.
///
/// Same return contract as [`scan_slab`].
fn scan_chunk(
    archive: &[u8],
    entry: &EncryptedEntry,
    charset: &Charset,
    state: &SearchState,
    start: u64,
    end: u64,
    len: usize,
) -> Option<()> {
    let mut candidate = Candidate::seek(charset, start, len);
    let mut pending = 0u64;

    for i in 0..end - start {
        if i & BATCH_MASK == 0 {
            state.add_attempts(pending);
            pending = 0;
            if state.found() {
                return Some(());
            }
            state.wait_while_paused();
            state.record_sample(candidate.as_bytes());
        }
        pending += 1;

        if let Some(keys) = validate::precheck(entry, candidate.as_bytes()) {
            if validate::confirm(entry, archive, keys) {
                state.add_attempts(pending);
                state.try_claim(candidate.as_bytes());
                return Some(());
            }
        }
        candidate.advance(charset);
    }
    state.add_attempts(pending);
    None
}

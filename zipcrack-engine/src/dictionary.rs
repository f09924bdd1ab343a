//! Dictionary candidate source.
//!
//! Candidates come in a fixed order: user-supplied words first, then the
//! embedded common-password corpus. The corpus is a newline-terminated byte
//! blob compiled into the binary; for parallel fan-out it is cut into ≈1 MiB
//! slabs on line boundaries, and each worker scans its slab sequentially.

/// The embedded common-password corpus, one candidate per line.
pub const EMBEDDED_CORPUS: &str = include_str!("../assets/passwords.txt");

/// Target slab size for parallel corpus scanning.
pub const SLAB_SIZE: usize = 1 << 20;

/// Split a corpus into slabs of roughly [`SLAB_SIZE`] bytes, each ending on
/// a line boundary so no candidate straddles two slabs.
pub fn corpus_slabs(corpus: &str) -> Vec<&str> {
    let mut slabs = Vec::new();
    let mut rest = corpus;
    while rest.len() > SLAB_SIZE {
        // Cut at the last LF inside the budget; a single line longer than a
        // whole slab gets its own oversized slab.
        let cut = match rest[..SLAB_SIZE].rfind('\n') {
            Some(p) => p + 1,
            None => match rest.find('\n') {
                Some(p) => p + 1,
                None => break,
            },
        };
        let (slab, tail) = rest.split_at(cut);
        slabs.push(slab);
        rest = tail;
    }
    if !rest.is_empty() {
        slabs.push(rest);
    }
    slabs
}

/// Iterate the usable candidates of one slab.
///
/// Lines are LF-delimited; a CR immediately before the LF is stripped, empty
/// lines are skipped, and lines longer than `max_len` bytes are skipped.
pub fn candidates(slab: &str, max_len: usize) -> impl Iterator<Item = &[u8]> {
    slab.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).as_bytes())
        .filter(move |line| !line.is_empty() && line.len() <= max_len)
}

/// Number of non-empty lines in a corpus, for the estimator.
#[must_use]
pub fn line_count(corpus: &str) -> usize {
    corpus
        .split('\n')
        .filter(|line| !line.trim_end_matches('\r').is_empty())
        .count()
}

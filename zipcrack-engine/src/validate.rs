//! Candidate validation.
//!
//! Two phases. The pre-check costs a key-schedule run over the password plus
//! the 12-byte preamble and rejects ~255/256 of wrong candidates without
//! touching the ciphertext; it allocates nothing. The confirmation decrypts
//! and decompresses the whole entry and verifies the stored CRC-32, which is
//! authoritative; it runs at most a handful of times per invocation, so its
//! scratch allocations do not matter.

use crate::locator::{EncryptedEntry, Method};
use flate2::read::DeflateDecoder;
use std::io::Read;
use zipcrack_core::{Crc32, Keys};

/// Fast keystream pre-check.
///
/// Returns the cipher state positioned after the preamble when the final
/// decrypted preamble byte matches the reference check byte, so a confirming
/// caller can continue the same keystream into the ciphertext. `None` means
/// the candidate is certainly wrong; `Some` means it survives with a false
/// positive rate of roughly 1/256.
#[inline]
pub fn precheck(entry: &EncryptedEntry, password: &[u8]) -> Option<Keys> {
    let mut keys = Keys::from_password(password);
    let mut last = 0u8;
    for &byte in &entry.preamble {
        last = keys.decrypt_byte(byte);
    }
    if last == entry.check_byte {
        Some(keys)
    } else {
        None
    }
}

/// Authoritative confirmation for a candidate that passed [`precheck`].
///
/// Continues `keys` through the ciphertext, decompresses, and compares the
/// plaintext CRC-32 with the stored one. Every internal failure (bad deflate
/// stream, size mismatch, checksum mismatch) rejects the candidate; nothing
/// here is an error.
pub fn confirm(entry: &EncryptedEntry, archive: &[u8], mut keys: Keys) -> bool {
    let mut payload = archive[entry.ciphertext.clone()].to_vec();
    keys.decrypt_buffer(&mut payload);

    let plaintext = match entry.method {
        Method::Stored => payload,
        Method::Deflate => {
            let mut out = Vec::with_capacity(
                entry
                    .uncompressed_size
                    .map_or(payload.len() * 2, |n| n.min(1 << 24) as usize),
            );
            let mut decoder: Box<dyn Read + '_> = match entry.uncompressed_size {
                // A wrong key usually produces garbage that errors out early,
                // but a stream that inflates past the stored size is just as
                // disqualifying, so cut it off one byte over.
                Some(n) => Box::new(DeflateDecoder::new(&payload[..]).take(n + 1)),
                None => Box::new(DeflateDecoder::new(&payload[..])),
            };
            if decoder.read_to_end(&mut out).is_err() {
                return false;
            }
            out
        }
    };

    if let Some(expected) = entry.uncompressed_size {
        if plaintext.len() as u64 != expected {
            return false;
        }
    }

    Crc32::compute(&plaintext) == entry.crc32
}

/// Run both phases for one candidate.
#[inline]
pub fn test_candidate(entry: &EncryptedEntry, archive: &[u8], password: &[u8]) -> bool {
    match precheck(entry, password) {
        Some(keys) => confirm(entry, archive, keys),
        None => false,
    }
}

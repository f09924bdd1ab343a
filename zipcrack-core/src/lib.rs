//! # Zipcrack Core
//!
//! Core components for the zipcrack password recovery engine.
//!
//! This crate provides the primitives everything else is built on:
//!
//! - [`crc`]: the standard CRC-32 (ISO 3309) used both by the ZipCrypto key
//!   schedule and for plaintext verification
//! - [`keys`]: the traditional PKWARE ("ZipCrypto") stream cipher state
//! - [`error`]: the error taxonomy shared across the workspace
//!
//! ## Example
//!
//! ```rust
//! use zipcrack_core::crc::Crc32;
//! use zipcrack_core::keys::Keys;
//!
//! // CRC-32 of a buffer
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//!
//! // Cipher state derived from a password
//! let mut keys = Keys::from_password(b"secret");
//! let cipher_byte = keys.encrypt_byte(b'x');
//! let mut keys = Keys::from_password(b"secret");
//! assert_eq!(keys.decrypt_byte(cipher_byte), b'x');
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod error;
pub mod keys;

// Re-exports for convenience
pub use crc::Crc32;
pub use error::{CrackError, Result};
pub use keys::Keys;

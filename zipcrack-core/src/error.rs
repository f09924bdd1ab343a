//! Error types for zipcrack operations.
//!
//! Every failure the engine can surface to a caller is a variant here; the
//! distinction that matters is drawn in the engine itself: configuration and
//! archive-shape errors are returned before any worker starts, while
//! decryption/decompression failures during candidate testing are never
//! errors at all (they just reject the candidate).

use std::io;
use thiserror::Error;

/// The main error type for zipcrack operations.
#[derive(Debug, Error)]
pub enum CrackError {
    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The search configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The archive contains no encrypted local-file-header record.
    #[error("Archive contains no encrypted entry")]
    NoEncryptedEntry,

    /// The first encrypted entry uses AES or another non-ZipCrypto scheme.
    #[error("Unsupported encryption scheme (only traditional ZipCrypto is supported)")]
    UnsupportedEncryption,

    /// The encrypted entry uses a compression method other than stored or deflate.
    #[error("Unsupported compression method: {method}")]
    UnsupportedCompression {
        /// The raw method identifier from the local file header.
        method: u16,
    },

    /// The archive ends before the encrypted payload does.
    #[error("Truncated archive: {message}")]
    TruncatedArchive {
        /// Description of what was missing.
        message: String,
    },

    /// Every configured candidate was tested without a confirmed match.
    #[error("Password not found in the configured search space")]
    NotFound,

    /// The observer detached before the search completed.
    #[error("Search cancelled")]
    Cancelled,
}

/// Result type alias for zipcrack operations.
pub type Result<T> = std::result::Result<T, CrackError>;

impl CrackError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unsupported compression error.
    pub fn unsupported_compression(method: u16) -> Self {
        Self::UnsupportedCompression { method }
    }

    /// Create a truncated archive error.
    pub fn truncated(message: impl Into<String>) -> Self {
        Self::TruncatedArchive {
            message: message.into(),
        }
    }

    /// Short token for progress output, e.g. `"unsupported-encryption"`.
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Self::Io(_) => "io-error",
            Self::InvalidConfig { .. } => "invalid-config",
            Self::NoEncryptedEntry => "no-encrypted-entry",
            Self::UnsupportedEncryption => "unsupported-encryption",
            Self::UnsupportedCompression { .. } => "unsupported-compression",
            Self::TruncatedArchive { .. } => "truncated-archive",
            Self::NotFound => "not-found",
            Self::Cancelled => "cancelled",
        }
    }
}

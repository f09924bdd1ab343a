//! Search configuration.

use serde::{Deserialize, Serialize};
use zipcrack_core::{CrackError, Result};

/// Hard upper bound on candidate length.
pub const MAX_PASSWORD_LEN: usize = 16;

/// Configuration for one recovery invocation.
///
/// Immutable once the search starts. At least one character class must be
/// enabled, or the dictionary pass must be on; otherwise the search space is
/// empty and [`CrackConfig::validate`] rejects the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrackConfig {
    /// Shortest brute-force candidate length, inclusive.
    pub min_length: u32,
    /// Longest brute-force candidate length, inclusive (at most 16).
    pub max_length: u32,
    /// Include `a-z` in the alphabet.
    pub use_lowercase: bool,
    /// Include `A-Z` in the alphabet.
    pub use_uppercase: bool,
    /// Include `0-9` in the alphabet.
    pub use_numbers: bool,
    /// Include the 32 ASCII punctuation characters in the alphabet.
    pub use_symbols: bool,
    /// Run the embedded common-password corpus before brute force.
    pub use_dictionary: bool,
    /// Extra dictionary words, tried before the embedded corpus.
    #[serde(default)]
    pub custom_words: Vec<String>,
}

impl Default for CrackConfig {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 8,
            use_lowercase: true,
            use_uppercase: false,
            use_numbers: true,
            use_symbols: false,
            use_dictionary: true,
            custom_words: Vec::new(),
        }
    }
}

impl CrackConfig {
    /// Whether any character class is enabled.
    #[must_use]
    pub fn has_charset(&self) -> bool {
        self.use_lowercase || self.use_uppercase || self.use_numbers || self.use_symbols
    }

    /// Check the configuration against the engine's invariants.
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(CrackError::invalid_config("min_length must be at least 1"));
        }
        if self.min_length > self.max_length {
            return Err(CrackError::invalid_config(format!(
                "min_length {} exceeds max_length {}",
                self.min_length, self.max_length
            )));
        }
        if self.max_length as usize > MAX_PASSWORD_LEN {
            return Err(CrackError::invalid_config(format!(
                "max_length {} exceeds the supported maximum of {}",
                self.max_length, MAX_PASSWORD_LEN
            )));
        }
        if !self.has_charset() && !self.use_dictionary {
            return Err(CrackError::invalid_config(
                "no character class enabled and dictionary disabled: nothing to search",
            ));
        }
        Ok(())
    }
}

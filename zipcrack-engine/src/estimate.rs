//! Search-space estimator.
//!
//! The brute-force space for alphabet Σ and lengths `min..=max` is
//! `Σ_{L=min..max} |Σ|^L`, which overflows u64 as soon as the full 94-symbol
//! alphabet meets double-digit lengths, so the sum is carried as a big
//! integer. Dictionary passes add their candidate counts on top.

use crate::charset::Charset;
use crate::config::CrackConfig;
use crate::dictionary;
use num_bigint::BigUint;

/// Exact number of candidates the configured search would enumerate.
#[must_use]
pub fn estimate(config: &CrackConfig) -> BigUint {
    let charset = Charset::from_config(config);
    let mut total = BigUint::from(0u32);

    if !charset.is_empty() {
        let base = BigUint::from(charset.len());
        // power = |Σ|^min, then walk up to |Σ|^max.
        let mut power = BigUint::from(1u32);
        for _ in 0..config.min_length {
            power *= &base;
        }
        for len in config.min_length..=config.max_length {
            total += &power;
            if len < config.max_length {
                power *= &base;
            }
        }
    }

    total += BigUint::from(
        config
            .custom_words
            .iter()
            .filter(|word| !word.is_empty())
            .count(),
    );
    if config.use_dictionary {
        total += BigUint::from(dictionary::line_count(dictionary::EMBEDDED_CORPUS));
    }

    total
}

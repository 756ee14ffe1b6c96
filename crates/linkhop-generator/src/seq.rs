use crate::error::{GeneratorError, Result};
use crate::Generator;
use linkhop_core::Slug;
use std::sync::atomic::{AtomicU64, Ordering};

/// A slug generator using a sequential counter.
///
/// This generator produces codes like "lh000000", "lh000001", etc. Codes are
/// unique within one instance; for multi-node deployments give each node its
/// own prefix (e.g. "a-", "b-"). Pre-existing links with the same shape are
/// still caught by the store's uniqueness check.
///
/// The prefix must be made of slug characters and leave room for six digits.
/// Once the counter outgrows the slug length limit, generated slugs no longer
/// validate and callers must reject them.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SeqGenerator {
    /// Creates a new sequential generator with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self> {
        Self::with_offset(prefix, 0)
    }

    /// Creates a new sequential generator starting from a specific counter
    /// value, e.g. to resume after a restart.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Result<Self> {
        let prefix = prefix.into();
        Slug::new(format!("{prefix}{offset:06}"))
            .map_err(|e| GeneratorError::InvalidPrefix(format!("'{prefix}': {e}")))?;

        Ok(Self {
            counter: AtomicU64::new(offset),
            prefix,
        })
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> Slug {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        Slug::new_unchecked(format!("{}{:06}", self.prefix, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_generator_produces_sequential_codes() {
        let generator = SeqGenerator::with_prefix("lh").unwrap();

        assert_eq!(generator.generate().as_str(), "lh000000");
        assert_eq!(generator.generate().as_str(), "lh000001");
        assert_eq!(generator.generate().as_str(), "lh000002");
    }

    #[test]
    fn seq_generator_with_offset() {
        let generator = SeqGenerator::with_offset("lh", 1000).unwrap();

        assert_eq!(generator.generate().as_str(), "lh001000");
        assert_eq!(generator.generate().as_str(), "lh001001");
    }

    #[test]
    fn seq_generator_output_is_a_valid_slug() {
        let generator = SeqGenerator::with_prefix("node-a").unwrap();
        assert!(Slug::new(generator.generate().as_str()).is_ok());
    }

    #[test]
    fn rejects_prefix_too_long_for_a_slug() {
        // 27 + 6 digits > 32
        let err = SeqGenerator::with_prefix("x".repeat(27)).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidPrefix(_)));

        assert!(SeqGenerator::with_prefix("x".repeat(26)).is_ok());
    }

    #[test]
    fn rejects_prefix_with_invalid_characters() {
        for prefix in ["a/b", "with space", "ü-"] {
            let err = SeqGenerator::with_prefix(prefix).unwrap_err();
            assert!(matches!(err, GeneratorError::InvalidPrefix(_)), "{prefix}");
        }
    }

    #[test]
    fn rejects_offset_that_overflows_the_slug() {
        let err = SeqGenerator::with_offset("x".repeat(20), 10u64.pow(12)).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidPrefix(_)));
    }
}

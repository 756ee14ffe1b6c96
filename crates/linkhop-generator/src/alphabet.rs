use crate::error::{GeneratorError, Result};
use crate::Generator;
use linkhop_core::Slug;
use typed_builder::TypedBuilder;

/// Lowercase alphanumerics.
pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// 36^7 ≈ 7.8e10 candidates.
pub const DEFAULT_LENGTH: usize = 7;

#[derive(Debug, Clone, TypedBuilder)]
pub struct AlphabetSettings {
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    alphabet: String,
    #[builder(default = DEFAULT_LENGTH)]
    length: usize,
}

/// Draws every symbol of a slug uniformly at random from a fixed alphabet.
#[derive(Debug, Clone)]
pub struct AlphabetGenerator {
    symbols: Vec<char>,
    length: usize,
}

impl AlphabetGenerator {
    /// Builds a generator, rejecting settings that could yield invalid slugs.
    pub fn new(settings: AlphabetSettings) -> Result<Self> {
        let mut symbols: Vec<char> = settings.alphabet.chars().collect();
        symbols.sort_unstable();
        symbols.dedup();

        if symbols.len() < 2 {
            return Err(GeneratorError::InvalidAlphabet(
                "at least two distinct symbols are required".to_string(),
            ));
        }
        if let Some(bad) = symbols
            .iter()
            .find(|c| !(c.is_ascii_alphanumeric() || **c == '-' || **c == '_'))
        {
            return Err(GeneratorError::InvalidAlphabet(format!(
                "symbol '{bad}' is not allowed in slugs"
            )));
        }
        if !(linkhop_core::slug::MIN_LENGTH..=linkhop_core::slug::MAX_LENGTH)
            .contains(&settings.length)
        {
            return Err(GeneratorError::InvalidLength(format!(
                "must be between {} and {}, got {}",
                linkhop_core::slug::MIN_LENGTH,
                linkhop_core::slug::MAX_LENGTH,
                settings.length
            )));
        }

        Ok(Self {
            symbols,
            length: settings.length,
        })
    }
}

impl Default for AlphabetGenerator {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.chars().collect(),
            length: DEFAULT_LENGTH,
        }
    }
}

impl Generator for AlphabetGenerator {
    fn generate(&self) -> Slug {
        let slug: String = std::iter::repeat_with(|| {
            self.symbols[rand::random_range(0..self.symbols.len())]
        })
        .take(self.length)
        .collect();
        Slug::new_unchecked(slug)
    }
}

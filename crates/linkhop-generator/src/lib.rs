pub mod alphabet;
pub mod error;
pub mod seq;

pub use alphabet::{AlphabetGenerator, AlphabetSettings};
pub use error::{GeneratorError, Result};
pub use seq::SeqGenerator;

use linkhop_core::Slug;

/// Trait for generating candidate slugs.
///
/// Implementations are pure generators that don't interact with storage;
/// uniqueness is enforced by the link store, and callers regenerate on a
/// conflict. Every generated slug must pass [`Slug::new`].
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate slug.
    fn generate(&self) -> Slug;
}

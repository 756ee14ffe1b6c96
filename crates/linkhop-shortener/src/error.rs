use linkhop_core::{CoreError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),
    #[error("slug already exists: {0}")]
    SlugConflict(String),
    #[error("no free slug after {0} attempts")]
    SlugsExhausted(u32),
    #[error("generator produced an invalid slug: {0}")]
    InvalidGeneratedSlug(String),
    #[error("no link for slug: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl ShortenerError {
    /// Whether the request itself was at fault and retrying it cannot help.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::InvalidSlug(_) | Self::InvalidTtl(_)
        )
    }
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidSlug(message) => Self::InvalidSlug(message),
            CoreError::InvalidUrl(message) => Self::InvalidUrl(message),
            CoreError::InvalidTtl(message) => Self::InvalidTtl(message),
        }
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict(slug) => Self::SlugConflict(slug),
            other => Self::Storage(other),
        }
    }
}

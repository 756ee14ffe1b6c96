use linkhop_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedirectorError>;

#[derive(Debug, Error)]
pub enum RedirectorError {
    #[error("no link for slug: {0}")]
    NotFound(String),
    /// The link store could not answer; the caller may retry.
    #[error("link store unavailable: {0}")]
    Storage(#[from] StorageError),
}

impl RedirectorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

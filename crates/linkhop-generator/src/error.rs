use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),
    #[error("invalid slug length: {0}")]
    InvalidLength(String),
    #[error("invalid slug prefix: {0}")]
    InvalidPrefix(String),
}

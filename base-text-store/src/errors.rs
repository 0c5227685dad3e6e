use thiserror::Error;

pub type Result<T> = std::result::Result<T, BaseTextError>;

#[derive(Debug, Error)]
pub enum BaseTextError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("base text for manifestation '{0}' not found")]
    NotFound(String),

    #[error("span [{start}, {end}) is out of range or splits a UTF-8 character")]
    InvalidSpan { start: i64, end: i64 },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

//! Error type shared by every repository and annotation handler.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    /// Caller-supplied data fails a request-level rule.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A graph-level invariant would be violated by the write.
    #[error("{0}")]
    Validation(String),

    /// Explicitly unsupported path.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("graph driver error: {0}")]
    Driver(#[from] neo4rs::Error),

    #[error("malformed record: {0}")]
    Decode(#[from] neo4rs::DeError),
}

impl GraphError {
    pub fn not_found(message: impl Into<String>) -> Self {
        GraphError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        GraphError::Validation(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        GraphError::InvalidRequest(message.into())
    }
}

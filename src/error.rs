use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy for every store operation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("email is already registered")]
    EmailTaken,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("transaction retries exhausted on {0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("sign in required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// A stored document that does not round-trip through the schema.
///
/// Decoding is strict: a missing or malformed field fails the whole read
/// instead of silently dropping the record.
#[derive(Debug, Error)]
#[error("malformed {collection} document {id}: {source}")]
pub struct DecodeError {
    pub collection: &'static str,
    pub id: Uuid,
    #[source]
    pub source: serde_json::Error,
}

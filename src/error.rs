//! Error types
//!
//! Every fallible operation in the crate returns a `ProgressionError`.

use thiserror::Error;

use crate::store::{StoreError, UserId};

/// Errors raised by the progression engine and gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// Malformed arguments to an engine function (caller bug)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Award amounts must be strictly positive
    #[error("invalid XP amount {amount}: awards must be positive")]
    InvalidAmount { amount: i64 },

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("user already registered: {0}")]
    UserExists(UserId),

    /// Transient store failure; the caller decides whether to retry
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid level curve, unlock table or config file
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<StoreError> for ProgressionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ProgressionError::UserNotFound(id),
            StoreError::AlreadyExists(id) => ProgressionError::UserExists(id),
            StoreError::Corrupt(msg) => ProgressionError::StoreUnavailable(format!("corrupt record: {}", msg)),
            StoreError::Unavailable(msg) => ProgressionError::StoreUnavailable(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProgressionError>;

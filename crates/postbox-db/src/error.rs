use std::fmt;

use thiserror::Error;

/// Which user a failed existence check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Recipient,
    Sender,
    /// The owner of an inbox.
    User,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Recipient => f.write_str("Recipient"),
            Party::Sender => f.write_str("Sender"),
            Party::User => f.write_str("User"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Username cannot be an empty string.")]
    EmptyUsername,

    #[error("Username already exists.")]
    UsernameExists,

    #[error("{0} does not exist.")]
    UserNotFound(Party),

    /// No message with the id exists in the addressed inbox.
    #[error("No message with this message id exists.")]
    MessageNotFound,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// True for storage-engine faults, false for rejected input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::LockPoisoned)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

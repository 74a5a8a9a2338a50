use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. `username` is the primary key and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
    /// Watermark for "new" messages, advanced on every inbox read.
    pub last_seen: DateTime<Utc>,
}

/// Registration input. `last_seen` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_username: String,
    pub recipient_username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

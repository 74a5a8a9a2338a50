//! Row mapping between SQLite and the shared entity types.
//!
//! Timestamps are stored as fixed-width RFC 3339 text with six fractional
//! digits, so string comparison in SQL matches chronological order.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub use postbox_types::{Message, NewUser, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub(crate) const USER_COLUMNS: &str = "username, name, last_seen";
pub(crate) const MESSAGE_COLUMNS: &str =
    "id, sender_username, recipient_username, content, timestamp";

pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    decode_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Expects the columns in [`USER_COLUMNS`] order.
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        username: row.get(0)?,
        name: row.get(1)?,
        last_seen: timestamp_column(row, 2)?,
    })
}

/// Expects the columns in [`MESSAGE_COLUMNS`] order.
pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_username: row.get(1)?,
        recipient_username: row.get(2)?,
        content: row.get(3)?,
        timestamp: timestamp_column(row, 4)?,
    })
}

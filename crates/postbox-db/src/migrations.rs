use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::models::decode_timestamp;

/// Create-if-absent for every table and index.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            username    TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            last_seen   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id                  TEXT PRIMARY KEY NOT NULL,
            sender_username     TEXT NOT NULL,
            recipient_username  TEXT NOT NULL,
            content             TEXT NOT NULL,
            timestamp           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_username);

        -- Inbox reads filter by recipient and sort by time
        CREATE INDEX IF NOT EXISTS idx_messages_recipient_timestamp
            ON messages(recipient_username, timestamp);
        ",
    )?;

    info!("Database schema ready");
    Ok(())
}

pub fn teardown(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS messages;
        DROP TABLE IF EXISTS users;
        ",
    )?;

    info!("Database schema dropped");
    Ok(())
}

/// Newest instant already persisted in either table.
pub(crate) fn latest_timestamp(conn: &Connection) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn.query_row(
        "SELECT MAX(ts) FROM (
             SELECT MAX(last_seen) AS ts FROM users
             UNION ALL
             SELECT MAX(timestamp) AS ts FROM messages
         )",
        [],
        |row| row.get(0),
    )?;

    Ok(raw.and_then(|raw| match decode_timestamp(&raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!("Ignoring unparsable stored timestamp '{}': {}", raw, e);
            None
        }
    }))
}

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::error::{Party, Result, StoreError};
use crate::models::{
    MESSAGE_COLUMNS, Message, NewUser, USER_COLUMNS, User, encode_timestamp, message_from_row,
    user_from_row,
};
use crate::Database;

/// Ids per `DELETE ... IN (...)` statement, well below SQLite's bound-parameter limit.
const DELETE_CHUNK: usize = 500;

impl Database {
    // -- Users --

    pub fn register_user(&self, user: &NewUser) -> Result<User> {
        if user.username.is_empty() {
            return Err(StoreError::EmptyUsername);
        }

        self.with_tx(|tx| {
            if query_user(tx, &user.username)?.is_some() {
                return Err(StoreError::UsernameExists);
            }

            let last_seen = self.next_timestamp()?;
            tx.execute(
                "INSERT INTO users (username, name, last_seen) VALUES (?1, ?2, ?3)",
                params![user.username, user.name, encode_timestamp(&last_seen)],
            )
            .map_err(username_conflict)?;

            debug!(username = %user.username, "User registered");
            Ok(User {
                username: user.username.clone(),
                name: user.name.clone(),
                last_seen,
            })
        })
    }

    pub fn get_user(&self, username: &str) -> Result<User> {
        self.with_conn(|conn| {
            query_user(conn, username)?.ok_or(StoreError::UserNotFound(Party::User))
        })
    }

    // -- Messages --

    /// Recipient existence is checked before sender existence.
    pub fn send_message(&self, content: &str, recipient: &str, sender: &str) -> Result<Message> {
        self.with_tx(|tx| {
            require_user(tx, recipient, Party::Recipient)?;
            require_user(tx, sender, Party::Sender)?;

            let message = Message {
                id: self.next_message_id(),
                sender_username: sender.to_string(),
                recipient_username: recipient.to_string(),
                content: content.to_string(),
                timestamp: self.next_timestamp()?,
            };

            tx.execute(
                "INSERT INTO messages (id, sender_username, recipient_username, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id,
                    message.sender_username,
                    message.recipient_username,
                    message.content,
                    encode_timestamp(&message.timestamp),
                ],
            )?;

            debug!(id = %message.id, %sender, %recipient, "Message stored");
            Ok(message)
        })
    }

    /// Whole inbox, oldest first. Advances the user's `last_seen`.
    pub fn list_all_messages(&self, username: &str) -> Result<Vec<Message>> {
        self.read_inbox(username, false)
    }

    /// Messages newer than the user's `last_seen`, oldest first. Advances `last_seen`.
    pub fn list_new_messages(&self, username: &str) -> Result<Vec<Message>> {
        self.read_inbox(username, true)
    }

    pub fn get_message(&self, username: &str, message_id: &str) -> Result<Message> {
        self.with_conn(|conn| {
            require_user(conn, username, Party::User)?;

            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1 AND recipient_username = ?2"
            );
            conn.query_row(&sql, params![message_id, username], message_from_row)
                .optional()?
                .ok_or(StoreError::MessageNotFound)
        })
    }

    /// Delete one message from `username`'s inbox. A message addressed to
    /// someone else counts as missing.
    pub fn delete_message(&self, username: &str, message_id: &str) -> Result<()> {
        self.with_tx(|tx| {
            require_user(tx, username, Party::User)?;

            let removed = tx.execute(
                "DELETE FROM messages WHERE id = ?1 AND recipient_username = ?2",
                params![message_id, username],
            )?;
            if removed == 0 {
                return Err(StoreError::MessageNotFound);
            }

            debug!(%username, id = %message_id, "Message deleted");
            Ok(())
        })
    }

    /// Delete whichever of `message_ids` are in `username`'s inbox; the rest
    /// are ignored. Returns the number of rows removed.
    pub fn delete_messages(&self, username: &str, message_ids: &[String]) -> Result<usize> {
        self.with_tx(|tx| {
            require_user(tx, username, Party::User)?;

            let mut removed = 0;
            for chunk in message_ids.chunks(DELETE_CHUNK) {
                let placeholders: Vec<String> =
                    (2..chunk.len() + 2).map(|i| format!("?{}", i)).collect();
                let sql = format!(
                    "DELETE FROM messages WHERE recipient_username = ?1 AND id IN ({})",
                    placeholders.join(", ")
                );
                let bound = std::iter::once(username).chain(chunk.iter().map(String::as_str));
                removed += tx.execute(&sql, params_from_iter(bound))?;
            }

            debug!(%username, requested = message_ids.len(), removed, "Messages deleted");
            Ok(removed)
        })
    }

    /// The cutoff is the `last_seen` read inside this transaction, and the new
    /// `last_seen` is issued before the query runs.
    fn read_inbox(&self, username: &str, only_new: bool) -> Result<Vec<Message>> {
        self.with_tx(|tx| {
            let user = query_user(tx, username)?.ok_or(StoreError::UserNotFound(Party::User))?;
            let seen_at = self.next_timestamp()?;

            let cutoff = only_new.then(|| encode_timestamp(&user.last_seen));
            let messages = query_inbox(tx, username, cutoff.as_deref())?;

            tx.execute(
                "UPDATE users SET last_seen = ?1 WHERE username = ?2",
                params![encode_timestamp(&seen_at), username],
            )?;

            debug!(%username, only_new, count = messages.len(), "Inbox read");
            Ok(messages)
        })
    }
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let user = conn.query_row(&sql, [username], user_from_row).optional()?;
    Ok(user)
}

fn require_user(conn: &Connection, username: &str, party: Party) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [username],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::UserNotFound(party))
    }
}

fn query_inbox(conn: &Connection, username: &str, after: Option<&str>) -> Result<Vec<Message>> {
    // rowid breaks ties between equal timestamps in insertion order
    let rows = match after {
        Some(cutoff) => {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE recipient_username = ?1 AND timestamp > ?2
                 ORDER BY timestamp ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![username, cutoff], message_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE recipient_username = ?1
                 ORDER BY timestamp ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([username], message_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    Ok(rows)
}

/// A primary-key violation on insert means another writer took the name.
fn username_conflict(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::UsernameExists
        }
        other => other.into(),
    }
}

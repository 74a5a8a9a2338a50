//! SQLite-backed message store.
//!
//! [`Database`] is the only gateway to persisted users and messages. Every
//! operation runs as a single `IMMEDIATE` transaction while holding the
//! connection lock, so check-then-write sequences are never interleaved.

pub mod clock;
pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidHexIds};
pub use error::{Party, Result, StoreError};

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::clock::Ticker;

pub struct Database {
    conn: Mutex<Connection>,
    ticker: Ticker,
    ids: Box<dyn IdGenerator>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers from other processes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let db = Self::from_connection(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Open a private in-memory store. Its contents vanish on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self::from_connection(conn)?;
        debug!("In-memory database opened");
        Ok(db)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::initialize(&conn)?;
        let ticker = Ticker::new(Box::new(SystemClock));
        if let Some(latest) = migrations::latest_timestamp(&conn)? {
            ticker.observe(latest)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
            ticker,
            ids: Box::new(UuidHexIds),
        })
    }

    /// Replace the time source. Timestamps already issued still bound the
    /// next one from below.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.ticker.set_clock(Box::new(clock));
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Create the tables and indexes if they are missing.
    pub fn initialize_schema(&self) -> Result<()> {
        self.with_conn(|conn| Ok(migrations::initialize(conn)?))
    }

    /// Drop every table. Only meant for ephemeral stores and tests.
    pub fn teardown_schema(&self) -> Result<()> {
        self.with_conn(|conn| Ok(migrations::teardown(conn)?))
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    /// Run `f` inside one transaction. It commits only when `f` returns `Ok`;
    /// any error drops the transaction, which rolls it back.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub(crate) fn next_timestamp(&self) -> Result<DateTime<Utc>> {
        self.ticker.tick()
    }

    pub(crate) fn next_message_id(&self) -> String {
        self.ids.next_id()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

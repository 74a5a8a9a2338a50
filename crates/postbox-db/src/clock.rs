//! Time and id sources injected into the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::{Result, StoreError};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUIDv4 rendered as 32 lowercase hex digits.
pub struct UuidHexIds;

impl IdGenerator for UuidHexIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic ids: `msg-000001`, `msg-000002`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("msg-{:06}", n)
    }
}

/// Issues strictly increasing, microsecond-truncated timestamps.
///
/// A message sent after an inbox read must carry a timestamp greater than the
/// `last_seen` written by that read, otherwise the `timestamp > last_seen`
/// cutoff would skip it.
pub(crate) struct Ticker {
    clock: Box<dyn Clock>,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Ticker {
    pub(crate) fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }

    pub(crate) fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
    }

    /// Raise the floor to an already persisted instant.
    pub(crate) fn observe(&self, instant: DateTime<Utc>) -> Result<()> {
        let mut last = self.last.lock().map_err(|_| StoreError::LockPoisoned)?;
        if last.is_none_or(|prev| instant > prev) {
            *last = Some(instant);
        }
        Ok(())
    }

    pub(crate) fn tick(&self) -> Result<DateTime<Utc>> {
        let mut last = self.last.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut now = self.clock.now().trunc_subsecs(6);
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + TimeDelta::microseconds(1);
            }
        }
        *last = Some(now);
        Ok(now)
    }
}

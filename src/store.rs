use crate::{transaction::Transaction, Amount, WINDOW_MS};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use thiserror::Error;

/// Why an insertion was refused. Note the two variants are not equally severe:
/// a too-old transaction is stale data we silently drop (the HTTP layer
/// answers 204), while a future-dated one is a genuine client error (422).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RejectedTimestamp {
    /// More than 60 seconds in the past at insertion time.
    #[error("transaction older than 60 seconds.")]
    TooOld,

    /// Strictly after the current time, even by microseconds.
    #[error("transaction has future date.")]
    TooFuture,
}

/// Gatekeeper and owner of every accepted transaction.
///
/// The store is shared by concurrent request handlers, so the collection sits
/// behind an `RwLock`: writers (`add`, `delete_all`) are exclusive, readers
/// (`snapshot`) run concurrently and never observe a half-applied mutation.
///
/// The store is never pruned. A transaction accepted while fresh stays stored
/// after it ages out of the statistics window; only `delete_all` removes data.
#[derive(Debug, Default)]
pub struct TransactionStore {
    transactions: RwLock<Vec<Transaction>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
        }
    }

    /// Validate the timestamp against the wall clock, then append.
    /// Acceptance here is independent from the query-time window filter: both
    /// checks run against "now" at their own call time.
    pub fn add(&self, amount: Amount, timestamp: DateTime<Utc>) -> Result<(), RejectedTimestamp> {
        validate_timestamp(timestamp, Utc::now())?;

        self.transactions
            .write()
            .push(Transaction { amount, timestamp });

        Ok(())
    }

    /// Drop everything. Idempotent.
    pub fn delete_all(&self) {
        self.transactions.write().clear();
    }

    /// Copy of the current contents, for read-only consumption by the
    /// statistics engine. Handing out a copy (rather than a guard or a
    /// reference) keeps callers from mutating the store behind our back, and
    /// keeps the lock held only for the duration of the clone.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.read().clone()
    }
}

// Exactly 60 seconds old is still accepted: only strictly-more-than-60s is
// too old. The future side is strict the other way around, so a timestamp a
// few microseconds ahead of the clock is already refused.
fn validate_timestamp(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), RejectedTimestamp> {
    if timestamp < now - Duration::milliseconds(WINDOW_MS) {
        return Err(RejectedTimestamp::TooOld);
    }

    if timestamp > now {
        return Err(RejectedTimestamp::TooFuture);
    }

    Ok(())
}

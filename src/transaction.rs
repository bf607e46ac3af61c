use crate::Amount;
use chrono::{DateTime, Utc};

/// A single recorded transaction. Once the store has accepted it, it is never
/// mutated; statistics are always derived from copies.
///
/// The amount keeps whatever precision the caller sent. Rounding to 2 places
/// only happens when aggregates are built, so `0.005` + `0.005` sums to
/// `0.01` instead of disappearing at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

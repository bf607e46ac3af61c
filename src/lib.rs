//! Records monetary transactions in memory and computes aggregate statistics
//! (sum, average, max, min, count) over a rolling 60-second window, exposed
//! through a small HTTP API.
//!
//! Nothing is persisted: the whole state is one shared [`store::TransactionStore`].

pub mod api;
pub mod statistics;
pub mod store;
pub mod transaction;

// I decided to use a decimal library instead of the built-in f64 type:
// amounts are money, and the half-up rounding to 2 places we promise in the
// statistics output needs exact base-10 arithmetic to hold up.
pub type Amount = rust_decimal::Decimal;

/// Length of the statistics window, in milliseconds. The same figure bounds
/// how old a timestamp can be at insertion time.
pub const WINDOW_MS: i64 = 60_000;

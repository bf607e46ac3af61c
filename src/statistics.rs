use crate::{transaction::Transaction, Amount, WINDOW_MS};
use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Aggregates over the transactions of the last 60 seconds. Recomputed fresh
/// on every query, never stored.
///
/// The decimal fields always carry exactly 2 fractional digits and serialise
/// as strings ("162.71"), `count` as a plain integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistic {
    pub sum: Amount,
    pub avg: Amount,
    pub max: Amount,
    pub min: Amount,
    pub count: u64,
}

impl Statistic {
    /// Plain constructor: fields are expected to be rounded already.
    pub fn new(sum: Amount, avg: Amount, max: Amount, min: Amount, count: u64) -> Self {
        Self {
            sum,
            avg,
            max,
            min,
            count,
        }
    }

    /// The statistic of an empty window: everything "0.00", count 0.
    pub fn zero() -> Self {
        Self::new(dec!(0.00), dec!(0.00), dec!(0.00), dec!(0.00), 0)
    }
}

/// Compute the statistic over the entries whose timestamp lies strictly
/// within 60 seconds of `now`, in either direction.
///
/// Note the window check is deliberately not the same as the insert-time
/// check in the store: exactly-60s-old is accepted on insert but already
/// excluded here, and both edges are observable. Don't unify them.
pub fn compute(transactions: &[Transaction], now: DateTime<Utc>) -> Statistic {
    let amounts: Vec<Amount> = transactions
        .iter()
        .filter(|transaction| within_window(transaction.timestamp, now))
        .map(|transaction| transaction.amount)
        .collect();

    let count = amounts.len() as u64;
    if count == 0 {
        return Statistic::zero();
    }

    let sum: Amount = amounts.iter().copied().sum();
    // The set is non-empty, so max/min exist; the fallbacks are unreachable.
    let max = amounts.iter().copied().max().unwrap_or(Amount::ZERO);
    let min = amounts.iter().copied().min().unwrap_or(Amount::ZERO);

    // I compute the average through f64 on purpose. Exact decimal division of
    // 128.01 by 2 gives 64.005, which half-up rounding would take to 64.01 —
    // but the double quotient lands just below the midpoint and rounds to
    // 64.00, and that is the behaviour callers see and test against.
    // `from_f64_retain` keeps the full binary expansion instead of snapping
    // back to the shortest decimal, which is what makes the distinction hold.
    let avg = Decimal::from_f64_retain(sum.to_f64().unwrap_or_default() / count as f64)
        .unwrap_or_default();

    Statistic::new(
        round_half_up(sum),
        round_half_up(avg),
        round_half_up(max),
        round_half_up(min),
        count,
    )
}

fn within_window(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - timestamp).num_milliseconds().abs() < WINDOW_MS
}

// Half-away-from-zero at the 3rd digit, then padded so the result always
// shows 2 fractional digits: 123.2 renders "123.20", -0.005 becomes "-0.01".
fn round_half_up(amount: Amount) -> Amount {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn transaction(amount: Amount, timestamp: DateTime<Utc>) -> Transaction {
        Transaction { amount, timestamp }
    }

    #[test]
    fn test_compute_empty() {
        let got = compute(&[], Utc::now());
        assert_eq!(Statistic::zero(), got);
        assert_eq!(0, got.count);
        assert_eq!("0.00", got.sum.to_string());
    }

    #[test]
    fn test_compute_single_transaction() {
        let now = Utc::now();
        let transactions = vec![transaction(dec!(123.21), now - Duration::seconds(5))];

        let got = compute(&transactions, now);

        let want = Statistic::new(dec!(123.21), dec!(123.21), dec!(123.21), dec!(123.21), 1);
        assert_eq!(want, got);
    }

    #[test]
    fn test_compute_three_transactions() {
        let now = Utc::now();
        let transactions = vec![
            transaction(dec!(50.00), now - Duration::seconds(10)),
            transaction(dec!(100.50), now - Duration::seconds(20)),
            transaction(dec!(12.21), now - Duration::seconds(30)),
        ];

        let got = compute(&transactions, now);

        // 162.71 / 3 = 54.2366... -> 54.24
        let want = Statistic::new(dec!(162.71), dec!(54.24), dec!(100.50), dec!(12.21), 3);
        assert_eq!(want, got);
    }

    #[test]
    // An entry that aged past the window contributes nothing, even though it
    // is still part of the stored collection.
    fn test_compute_ignores_aged_out_transactions() {
        let now = Utc::now();
        let transactions = vec![
            transaction(dec!(999.99), now - Duration::seconds(80)),
            transaction(dec!(115.80), now - Duration::seconds(1)),
            transaction(dec!(12.21), now - Duration::seconds(2)),
        ];

        let got = compute(&transactions, now);

        // 128.01 / 2 divides to just under 64.005 in the float domain, so the
        // average is 64.00 rather than 64.01.
        let want = Statistic::new(dec!(128.01), dec!(64.00), dec!(115.80), dec!(12.21), 2);
        assert_eq!(want, got);
    }

    #[test]
    fn test_window_boundaries() {
        let now = Utc::now();

        for (timestamp, want_included) in vec![
            (now, true),
            (now - Duration::milliseconds(59_999), true),
            // Exactly 60s is already out, unlike at insertion time.
            (now - Duration::milliseconds(60_000), false),
            (now - Duration::milliseconds(60_001), false),
            // The filter is symmetric: future entries within 60s count too.
            (now + Duration::seconds(30), true),
            (now + Duration::milliseconds(60_000), false),
        ] {
            let got = compute(&[transaction(dec!(1.00), timestamp)], now);
            let want_count = if want_included { 1 } else { 0 };
            assert_eq!(want_count, got.count, "timestamp offset: {:?}", timestamp - now);
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        let now = Utc::now();
        let transactions = vec![
            transaction(dec!(1.11), now - Duration::seconds(1)),
            transaction(dec!(2.22), now - Duration::seconds(2)),
        ];

        let first = compute(&transactions, now);
        let second = compute(&transactions, now);
        assert_eq!(first, second);
    }

    #[test]
    // Amounts keep their full precision until aggregation, so sub-cent values
    // survive the sum but round away in max/min.
    fn test_rounding_happens_after_aggregation() {
        let now = Utc::now();
        let transactions = vec![
            transaction(dec!(0.005), now),
            transaction(dec!(0.005), now),
        ];

        let got = compute(&transactions, now);

        assert_eq!(dec!(0.01), got.sum);
        assert_eq!(dec!(0.01), got.max);
        assert_eq!(dec!(0.01), got.min);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        for (raw, want) in vec![
            (dec!(0.005), dec!(0.01)),
            (dec!(-0.005), dec!(-0.01)),
            (dec!(0.004), dec!(0.00)),
            (dec!(123.2), dec!(123.20)),
            (dec!(1.995), dec!(2.00)),
        ] {
            let got = round_half_up(raw);
            assert_eq!(want, got, "rounding {}", raw);
            assert_eq!(2, got.scale());
        }
    }

    #[test]
    // The wire shape: decimals as strings with 2 fractional digits, count as
    // an integer.
    fn test_statistic_serialisation() {
        let statistic = Statistic::new(dec!(162.71), dec!(54.24), dec!(100.50), dec!(12.21), 3);

        let got = serde_json::to_value(&statistic).expect("serialisation should succeed");
        let want = serde_json::json!({
            "sum": "162.71",
            "avg": "54.24",
            "max": "100.50",
            "min": "12.21",
            "count": 3,
        });
        assert_eq!(want, got);
    }
}

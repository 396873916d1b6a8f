//! Turns a flat list of transactions into a gap-filled running balance series.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::dashboard::{Granularity, LedgerEntry};

/// The running balance at the end of one calendar bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    /// The first day of the bucket, serialized as `YYYY-MM-DD`.
    pub label: Date,
    /// The sum of every signed amount up to and including this bucket, rounded to cents.
    pub balance: f64,
}

/// Compute the cumulative balance for every bucket between the first and last
/// transaction, inclusive.
///
/// Buckets without transactions carry the previous balance forward. Entries are
/// summed in (occurred_at, id) order, so the result does not depend on the
/// order of `entries`. An empty slice gives an empty series.
pub fn aggregate(entries: &[LedgerEntry], granularity: Granularity) -> Vec<BalancePoint> {
    let mut ordered: Vec<&LedgerEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| (entry.occurred_at, entry.id));

    let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
        return Vec::new();
    };

    let mut bucket_totals: BTreeMap<Date, f64> = BTreeMap::new();
    for entry in &ordered {
        *bucket_totals
            .entry(granularity.floor(entry.occurred_at))
            .or_insert(0.0) += entry.signed_amount();
    }

    let last_bucket = granularity.floor(last.occurred_at);
    let mut bucket = granularity.floor(first.occurred_at);
    let mut running_balance = 0.0;
    let mut points = Vec::with_capacity(bucket_totals.len());

    while bucket <= last_bucket {
        running_balance += bucket_totals.get(&bucket).copied().unwrap_or(0.0);
        points.push(BalancePoint {
            label: bucket,
            balance: round_to_cents(running_balance),
        });
        bucket = granularity.next(bucket);
    }

    points
}

/// Round `value` to two decimal places.
///
/// The exact binary value of `value` is rounded, so `12.345` (stored as
/// slightly more than 12.345) becomes `12.35` and `10.005` (stored as
/// slightly less) becomes `10.0`. Values that are exactly halfway, such as
/// `0.125`, go to the even cent. Negative zero becomes zero.
pub fn round_to_cents(value: f64) -> f64 {
    let rounded = format!("{value:.2}").parse::<f64>().unwrap_or(value);

    if rounded == 0.0 { 0.0 } else { rounded }
}

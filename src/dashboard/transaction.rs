//! Database queries for retrieving dashboard transaction data.
//!
//! This module provides a slim transaction view for the balance series,
//! containing only the fields the aggregation needs.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{Kind, Transaction},
    user::UserID,
};

/// A transaction reduced to what the balance aggregation needs.
///
/// This is separate from the main [Transaction] model because the dashboard
/// does not need descriptions, categories or timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The ID of the transaction, used to break ties between entries on the same day.
    pub id: TransactionId,
    /// The positive magnitude of the transaction.
    pub amount: f64,
    /// Whether the amount adds to or subtracts from the balance.
    pub kind: Kind,
    /// When the transaction happened.
    pub occurred_at: Date,
}

impl LedgerEntry {
    /// The amount with the sign of its kind.
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }
}

impl From<&Transaction> for LedgerEntry {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            amount: transaction.amount,
            kind: transaction.kind,
            occurred_at: transaction.occurred_at,
        }
    }
}

/// Gets `user_id`'s transactions that occurred between `start` and `end`.
///
/// Both bounds are inclusive and either may be omitted.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query fails.
pub fn get_ledger_entries(
    user_id: UserID,
    start: Option<Date>,
    end: Option<Date>,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, occurred_at
             FROM \"transaction\"
             WHERE user_id = ?1
                AND (?2 IS NULL OR occurred_at >= ?2)
                AND (?3 IS NULL OR occurred_at <= ?3)
             ORDER BY occurred_at ASC, id ASC",
        )?
        .query_map((user_id.as_i64(), start, end), |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                amount: row.get(1)?,
                kind: row.get(2)?,
                occurred_at: row.get(3)?,
            })
        })?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

//! Partial updates for transactions.

use serde::{Deserialize, Deserializer};
use time::Date;

use crate::{
    database_id::CategoryId,
    transaction::{Kind, Transaction, TransactionBuilder},
};

/// The fields of a transaction that a client wants to change.
///
/// A field that is absent is left as is. For the nullable fields,
/// `Some(None)` (an explicit JSON `null`) clears the value.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionPatch {
    /// The new amount.
    pub amount: Option<f64>,
    /// The new kind.
    #[serde(alias = "type")]
    pub kind: Option<Kind>,
    /// The new occurrence date.
    pub occurred_at: Option<Date>,
    /// The new description, or `Some(None)` to remove it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    /// The new category, or `Some(None)` to uncategorise the transaction.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<CategoryId>>,
}

impl TransactionPatch {
    /// Merge the patch over `transaction`, producing the full set of values to store.
    pub fn apply(&self, transaction: &Transaction) -> TransactionBuilder {
        TransactionBuilder {
            amount: self.amount.unwrap_or(transaction.amount),
            kind: self.kind.unwrap_or(transaction.kind),
            occurred_at: self.occurred_at.unwrap_or(transaction.occurred_at),
            description: match &self.description {
                Some(description) => description.clone(),
                None => transaction.description.clone(),
            },
            category_id: self.category_id.unwrap_or(transaction.category_id),
        }
    }
}

// Any value that is present is wrapped in `Some`, so a JSON `null` becomes `Some(None)`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

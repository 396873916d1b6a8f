//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::get_category,
    database_id::{CategoryId, TransactionId},
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Money earned, adds to the balance.
    Credit,
    /// Money spent, subtracts from the balance.
    Debit,
}

impl Kind {
    /// The lowercase tag used in JSON, CSV and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Apply the sign of this kind to the positive magnitude `amount`.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

impl FromStr for Kind {
    type Err = Error;

    /// Parse "credit" or "debit", ignoring ASCII case and surrounding whitespace.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();

        if raw.eq_ignore_ascii_case("credit") {
            Ok(Self::Credit)
        } else if raw.eq_ignore_ascii_case("debit") {
            Ok(Self::Debit)
        } else {
            Err(Error::InvalidArgument(format!(
                "invalid kind \"{raw}\", expected \"credit\" or \"debit\""
            )))
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for Kind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Kind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The positive amount of money spent or earned in this transaction.
    pub amount: f64,
    /// Whether the amount was earned or spent.
    pub kind: Kind,
    /// When the transaction happened.
    pub occurred_at: Date,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// When the transaction was recorded, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, kind: Kind, occurred_at: Date) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            kind,
            occurred_at,
            description: None,
            category_id: None,
        }
    }

    /// The amount with the sign of its kind, positive for credits and
    /// negative for debits.
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }
}

/// A builder for creating [Transaction] instances.
///
/// Also used as the JSON body for creating a transaction.
#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct TransactionBuilder {
    /// The positive magnitude of the transaction, the sign comes from `kind`.
    pub amount: f64,

    /// Whether the amount was earned or spent.
    #[serde(alias = "type")]
    pub kind: Kind,

    /// The date when the transaction occurred.
    ///
    /// This is the date money moved, not when it was recorded.
    pub occurred_at: Date,

    /// A human-readable description of the transaction.
    #[serde(default)]
    pub description: Option<String>,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_owned);
        self
    }

    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Check the fields that the database cannot check on its own.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] if the amount is not a finite number
    /// greater than zero, or an [Error::InvalidCategory] if the category does
    /// not belong to `user_id`.
    fn validate(&self, user_id: UserID, connection: &Connection) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        if let Some(category_id) = self.category_id {
            match get_category(category_id, user_id, connection) {
                Ok(_) => {}
                Err(Error::CategoryNotFound) => {
                    return Err(Error::InvalidCategory(Some(category_id)));
                }
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }
}

/// Optional filters for [list_transactions].
///
/// Also used as the query string of the list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionFilter {
    /// Only include credits or debits.
    pub kind: Option<Kind>,
    /// Only include transactions in this category.
    pub category_id: Option<CategoryId>,
    /// The earliest occurrence date to include.
    pub start: Option<Date>,
    /// The latest occurrence date to include.
    pub end: Option<Date>,
    /// The maximum number of transactions to return, defaults to [TransactionFilter::DEFAULT_LIMIT].
    pub limit: Option<u32>,
    /// The number of transactions to skip.
    pub offset: Option<u32>,
}

impl TransactionFilter {
    /// The page size used when no limit is given.
    pub const DEFAULT_LIMIT: u32 = 100;
    /// The largest page size a caller may request.
    pub const MAX_LIMIT: u32 = 1000;
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction for `user_id` in the database from a builder.
///
/// Blank descriptions are stored as `None`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not positive,
/// - or [Error::InvalidCategory] if the category ID does not refer to one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate(user_id, connection)?;

    let description = normalize_description(builder.description.as_deref());

    connection
        .prepare(
            "INSERT INTO \"transaction\"
                (user_id, amount, kind, occurred_at, description, category_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, amount, kind, occurred_at, description, category_id, created_at",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.amount,
                builder.kind,
                builder.occurred_at,
                description,
                builder.category_id,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve one of `user_id`'s transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, occurred_at, description, category_id, created_at
             FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })
}

/// Retrieve `user_id`'s transactions that match `filter`, ordered by
/// occurrence date and then ID.
///
/// Both date bounds are inclusive.
pub fn list_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let limit = filter
        .limit
        .unwrap_or(TransactionFilter::DEFAULT_LIMIT)
        .min(TransactionFilter::MAX_LIMIT);
    let offset = filter.offset.unwrap_or(0);

    connection
        .prepare(
            "SELECT id, amount, kind, occurred_at, description, category_id, created_at
             FROM \"transaction\"
             WHERE user_id = ?1
                AND (?2 IS NULL OR kind = ?2)
                AND (?3 IS NULL OR category_id = ?3)
                AND (?4 IS NULL OR occurred_at >= ?4)
                AND (?5 IS NULL OR occurred_at <= ?5)
             ORDER BY occurred_at ASC, id ASC
             LIMIT ?6 OFFSET ?7",
        )?
        .query_map(
            (
                user_id.as_i64(),
                filter.kind,
                filter.category_id,
                filter.start,
                filter.end,
                limit,
                offset,
            ),
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Count `user_id`'s transactions that match `filter`, ignoring its limit and offset.
pub fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(id)
         FROM \"transaction\"
         WHERE user_id = ?1
            AND (?2 IS NULL OR kind = ?2)
            AND (?3 IS NULL OR category_id = ?3)
            AND (?4 IS NULL OR occurred_at >= ?4)
            AND (?5 IS NULL OR occurred_at <= ?5)",
        (
            user_id.as_i64(),
            filter.kind,
            filter.category_id,
            filter.start,
            filter.end,
        ),
        |row| row.get(0),
    )?;

    Ok(count as u64)
}

/// Retrieve `user_id`'s transactions recorded after `since` with an ID
/// greater than `after_id`, ordered by creation time and then ID.
///
/// Used by the transaction feed: `since` selects the backlog and `after_id`
/// skips transactions that were already sent.
pub fn list_transactions_created_after(
    user_id: UserID,
    since: Option<OffsetDateTime>,
    after_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let since = since.map(|since| since.to_offset(time::UtcOffset::UTC));

    connection
        .prepare(
            "SELECT id, amount, kind, occurred_at, description, category_id, created_at
             FROM \"transaction\"
             WHERE user_id = ?1
                AND (?2 IS NULL OR created_at > ?2)
                AND id > ?3
             ORDER BY created_at ASC, id ASC",
        )?
        .query_map((user_id.as_i64(), since, after_id), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace the mutable fields of one of `user_id`'s transactions with the
/// values in `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::InvalidAmount] or [Error::InvalidCategory] if the new values are invalid,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate(user_id, connection)?;

    let description = normalize_description(builder.description.as_deref());

    connection
        .prepare(
            "UPDATE \"transaction\"
             SET amount = ?1, kind = ?2, occurred_at = ?3, description = ?4, category_id = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING id, amount, kind, occurred_at, description, category_id, created_at",
        )?
        .query_row(
            (
                builder.amount,
                builder.kind,
                builder.occurred_at,
                description,
                builder.category_id,
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })
}

/// Delete one of `user_id`'s transactions.
///
/// # Errors
/// Returns an [Error::TransactionNotFound] if `id` does not refer to one of
/// the user's transactions.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                kind TEXT NOT NULL CHECK (kind IN ('credit', 'debit')),
                occurred_at TEXT NOT NULL,
                description TEXT,
                category_id INTEGER,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Used by the list endpoint and the balance series.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_occurred
         ON \"transaction\"(user_id, occurred_at, id);",
        (),
    )?;

    // Used by the transaction feed.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created
         ON \"transaction\"(user_id, created_at, id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let kind = row.get(2)?;
    let occurred_at = row.get(3)?;
    let description = row.get(4)?;
    let category_id = row.get(5)?;
    let created_at = row.get(6)?;

    Ok(Transaction {
        id,
        amount,
        kind,
        occurred_at,
        description,
        category_id,
        created_at,
    })
}

fn normalize_description(description: Option<&str>) -> Option<&str> {
    description
        .map(str::trim)
        .filter(|description| !description.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        Error,
        category::{CategoryName, create_category, delete_category},
        db::initialize,
        transaction::{
            Kind, Transaction, TransactionFilter, count_transactions, create_transaction,
            delete_transaction, get_transaction, list_transactions,
            list_transactions_created_after, update_transaction,
        },
        user::{Email, User, create_user},
    };

    fn get_test_connection() -> (Connection, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(Email::new_unchecked("test@test.com"), None, &conn).unwrap();
        (conn, user)
    }

    #[test]
    fn create_succeeds() {
        let (conn, user) = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            Transaction::build(amount, Kind::Debit, date!(2025 - 10 - 05)).description(Some("Tea")),
            user.id,
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert_eq!(transaction.kind, Kind::Debit);
                assert_eq!(transaction.description.as_deref(), Some("Tea"));
                assert_eq!(transaction.signed_amount(), -amount);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_non_positive_amount() {
        let (conn, user) = get_test_connection();

        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = create_transaction(
                Transaction::build(amount, Kind::Credit, date!(2025 - 10 - 05)),
                user.id,
                &conn,
            );

            assert!(
                matches!(result, Err(Error::InvalidAmount(_))),
                "want InvalidAmount for {amount}, got {result:?}"
            );
        }
    }

    #[test]
    fn create_fails_on_invalid_category_id() {
        let (conn, user) = get_test_connection();
        let category_id = Some(42);

        let result = create_transaction(
            Transaction::build(123.45, Kind::Credit, date!(2025 - 10 - 04)).category_id(category_id),
            user.id,
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(category_id)));
    }

    #[test]
    fn create_fails_on_other_users_category() {
        let (conn, user) = get_test_connection();
        let other_user = create_user(Email::new_unchecked("other@test.com"), None, &conn).unwrap();
        let category =
            create_category(CategoryName::new_unchecked("Food"), other_user.id, &conn).unwrap();

        let result = create_transaction(
            Transaction::build(1.0, Kind::Debit, date!(2025 - 10 - 04))
                .category_id(Some(category.id)),
            user.id,
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(category.id))));
    }

    #[test]
    fn get_other_users_transaction_is_not_found() {
        let (conn, user) = get_test_connection();
        let other_user = create_user(Email::new_unchecked("other@test.com"), None, &conn).unwrap();
        let transaction = create_transaction(
            Transaction::build(1.0, Kind::Debit, date!(2025 - 10 - 04)),
            user.id,
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, user.id, &conn),
            Ok(transaction.clone())
        );
        assert_eq!(
            get_transaction(transaction.id, other_user.id, &conn),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn list_applies_filters_with_inclusive_dates() {
        let (conn, user) = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Food"), user.id, &conn).unwrap();
        for (amount, kind, date, category_id) in [
            (1.0, Kind::Credit, date!(2025 - 10 - 01), None),
            (2.0, Kind::Debit, date!(2025 - 10 - 02), Some(category.id)),
            (3.0, Kind::Debit, date!(2025 - 10 - 03), Some(category.id)),
            (4.0, Kind::Debit, date!(2025 - 10 - 04), None),
        ] {
            create_transaction(
                Transaction::build(amount, kind, date).category_id(category_id),
                user.id,
                &conn,
            )
            .unwrap();
        }

        let amounts = |filter: TransactionFilter| -> Vec<f64> {
            list_transactions(user.id, &filter, &conn)
                .expect("Could not list transactions")
                .iter()
                .map(|transaction| transaction.amount)
                .collect()
        };

        assert_eq!(amounts(TransactionFilter::default()), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            amounts(TransactionFilter {
                kind: Some(Kind::Debit),
                ..Default::default()
            }),
            [2.0, 3.0, 4.0]
        );
        assert_eq!(
            amounts(TransactionFilter {
                category_id: Some(category.id),
                ..Default::default()
            }),
            [2.0, 3.0]
        );
        assert_eq!(
            amounts(TransactionFilter {
                start: Some(date!(2025 - 10 - 02)),
                end: Some(date!(2025 - 10 - 03)),
                ..Default::default()
            }),
            [2.0, 3.0]
        );
        assert_eq!(
            amounts(TransactionFilter {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            }),
            [2.0, 3.0]
        );
    }

    #[test]
    fn count_applies_filters_but_not_paging() {
        let (conn, user) = get_test_connection();
        let other_user = create_user(Email::new_unchecked("other@test.com"), None, &conn).unwrap();
        for (amount, kind, date) in [
            (1.0, Kind::Credit, date!(2025 - 10 - 01)),
            (2.0, Kind::Debit, date!(2025 - 10 - 02)),
            (3.0, Kind::Debit, date!(2025 - 10 - 03)),
        ] {
            create_transaction(Transaction::build(amount, kind, date), user.id, &conn).unwrap();
        }
        create_transaction(
            Transaction::build(9.0, Kind::Debit, date!(2025 - 10 - 02)),
            other_user.id,
            &conn,
        )
        .unwrap();

        let count = |filter: TransactionFilter| {
            count_transactions(user.id, &filter, &conn).expect("Could not count transactions")
        };

        assert_eq!(count(TransactionFilter::default()), 3);
        assert_eq!(
            count(TransactionFilter {
                kind: Some(Kind::Debit),
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            }),
            2
        );
        assert_eq!(
            count(TransactionFilter {
                start: Some(date!(2025 - 10 - 03)),
                ..Default::default()
            }),
            1
        );
    }

    #[test]
    fn list_orders_by_date_then_id() {
        let (conn, user) = get_test_connection();
        let later = create_transaction(
            Transaction::build(1.0, Kind::Credit, date!(2025 - 10 - 05)),
            user.id,
            &conn,
        )
        .unwrap();
        let first = create_transaction(
            Transaction::build(2.0, Kind::Credit, date!(2025 - 10 - 01)),
            user.id,
            &conn,
        )
        .unwrap();
        let second = create_transaction(
            Transaction::build(3.0, Kind::Credit, date!(2025 - 10 - 01)),
            user.id,
            &conn,
        )
        .unwrap();

        let got = list_transactions(user.id, &TransactionFilter::default(), &conn).unwrap();

        assert_eq!(got, [first, second, later]);
    }

    #[test]
    fn list_excludes_other_users() {
        let (conn, user) = get_test_connection();
        let other_user = create_user(Email::new_unchecked("other@test.com"), None, &conn).unwrap();
        create_transaction(
            Transaction::build(1.0, Kind::Credit, date!(2025 - 10 - 05)),
            other_user.id,
            &conn,
        )
        .unwrap();

        let got = list_transactions(user.id, &TransactionFilter::default(), &conn).unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn created_after_skips_seen_ids_and_old_transactions() {
        let (conn, user) = get_test_connection();
        let first = create_transaction(
            Transaction::build(1.0, Kind::Credit, date!(2025 - 10 - 05)),
            user.id,
            &conn,
        )
        .unwrap();
        let second = create_transaction(
            Transaction::build(2.0, Kind::Credit, date!(2025 - 10 - 05)),
            user.id,
            &conn,
        )
        .unwrap();

        let all = list_transactions_created_after(user.id, None, 0, &conn).unwrap();
        let unseen = list_transactions_created_after(user.id, None, first.id, &conn).unwrap();
        let future = list_transactions_created_after(
            user.id,
            Some(OffsetDateTime::now_utc() + Duration::hours(1)),
            0,
            &conn,
        )
        .unwrap();
        let past = list_transactions_created_after(
            user.id,
            Some(OffsetDateTime::now_utc() - Duration::hours(1)),
            0,
            &conn,
        )
        .unwrap();

        assert_eq!(all, [first.clone(), second.clone()]);
        assert_eq!(unseen, [second]);
        assert!(future.is_empty());
        assert_eq!(past.len(), 2);
    }

    #[test]
    fn update_replaces_fields() {
        let (conn, user) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(1.0, Kind::Credit, date!(2025 - 10 - 05)).description(Some("Old")),
            user.id,
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            transaction.id,
            Transaction::build(5.5, Kind::Debit, date!(2025 - 10 - 06)),
            user.id,
            &conn,
        )
        .expect("Could not update transaction");

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.amount, 5.5);
        assert_eq!(updated.kind, Kind::Debit);
        assert_eq!(updated.occurred_at, date!(2025 - 10 - 06));
        assert_eq!(updated.description, None);
        assert_eq!(updated.created_at, transaction.created_at);
    }

    #[test]
    fn update_missing_transaction_is_not_found() {
        let (conn, user) = get_test_connection();

        let result = update_transaction(
            42,
            Transaction::build(5.5, Kind::Debit, date!(2025 - 10 - 06)),
            user.id,
            &conn,
        );

        assert_eq!(result, Err(Error::TransactionNotFound));
    }

    #[test]
    fn delete_succeeds_once() {
        let (conn, user) = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(1.0, Kind::Credit, date!(2025 - 10 - 05)),
            user.id,
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(transaction.id, user.id, &conn), Ok(()));
        assert_eq!(
            delete_transaction(transaction.id, user.id, &conn),
            Err(Error::TransactionNotFound)
        );
    }

    #[test]
    fn deleting_category_uncategorises_transactions() {
        let (conn, user) = get_test_connection();
        let category = create_category(CategoryName::new_unchecked("Food"), user.id, &conn).unwrap();
        let transaction = create_transaction(
            Transaction::build(1.0, Kind::Debit, date!(2025 - 10 - 05))
                .category_id(Some(category.id)),
            user.id,
            &conn,
        )
        .unwrap();

        delete_category(category.id, user.id, &conn).unwrap();

        let got = get_transaction(transaction.id, user.id, &conn).unwrap();
        assert_eq!(got.category_id, None);
    }
}

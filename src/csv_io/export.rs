//! Exporting a user's transactions as a CSV file.

use axum::{
    Extension,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use csv::WriterBuilder;
use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    csv_io::CsvState,
    database_id::TransactionId,
    transaction::Kind,
    user::UserID,
};

const HEADER: [&str; 6] = ["id", "occurred_at", "amount", "kind", "description", "category"];

#[derive(Debug, Serialize)]
struct CsvExportRow {
    id: TransactionId,
    occurred_at: String,
    amount: String,
    kind: Kind,
    description: String,
    category: String,
}

/// Route handler that downloads all of the user's transactions as a CSV file.
pub async fn export_csv_endpoint(
    State(state): State<CsvState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let csv_text = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        export_transactions_csv(user_id, &connection)?
    };

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"transactions.csv\""),
        ],
        csv_text,
    )
        .into_response())
}

/// Write all of `user_id`'s transactions as CSV, ordered by occurrence date
/// and then ID.
///
/// The header is always written, amounts have two decimal places and missing
/// descriptions and categories are written as empty fields.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails or an
/// [Error::CSVWriteError] if the CSV could not be written.
pub fn export_transactions_csv(user_id: UserID, connection: &Connection) -> Result<String, Error> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|error| Error::CSVWriteError(error.to_string()))?;

    let mut stmt = connection.prepare(
        "SELECT t.id, t.occurred_at, t.amount, t.kind, t.description, c.name
         FROM \"transaction\" t
         LEFT JOIN category c ON c.id = t.category_id
         WHERE t.user_id = ?1
         ORDER BY t.occurred_at ASC, t.id ASC",
    )?;
    let rows = stmt.query_map([user_id.as_i64()], |row| {
        let occurred_at: Date = row.get(1)?;
        let amount: f64 = row.get(2)?;
        let description: Option<String> = row.get(4)?;
        let category: Option<String> = row.get(5)?;

        Ok(CsvExportRow {
            id: row.get(0)?,
            occurred_at: occurred_at.to_string(),
            amount: format!("{amount:.2}"),
            kind: row.get(3)?,
            description: description.unwrap_or_default(),
            category: category.unwrap_or_default(),
        })
    })?;

    for row in rows {
        writer
            .serialize(row?)
            .map_err(|error| Error::CSVWriteError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CSVWriteError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CSVWriteError(error.to_string()))
}

#[cfg(test)]
mod export_csv_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        csv_io::export::export_transactions_csv,
        db::initialize,
        transaction::{Kind, Transaction, create_transaction},
        user::{Email, User, create_user},
    };

    fn get_test_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(Email::new_unchecked("test@test.com"), None, &connection).unwrap();
        (connection, user)
    }

    #[test]
    fn empty_export_has_header() {
        let (connection, user) = get_test_connection();

        let got = export_transactions_csv(user.id, &connection).unwrap();

        assert_eq!(got, "id,occurred_at,amount,kind,description,category\n");
    }

    #[test]
    fn exports_rows_in_date_order() {
        let (connection, user) = get_test_connection();
        let category =
            create_category(CategoryName::new_unchecked("Food"), user.id, &connection).unwrap();
        create_transaction(
            Transaction::build(12.5, Kind::Debit, date!(2025 - 10 - 02))
                .description(Some("Lunch, with friends"))
                .category_id(Some(category.id)),
            user.id,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(100.0, Kind::Credit, date!(2025 - 10 - 01)),
            user.id,
            &connection,
        )
        .unwrap();

        let got = export_transactions_csv(user.id, &connection).unwrap();

        assert_eq!(
            got,
            "id,occurred_at,amount,kind,description,category\n\
             2,2025-10-01,100.00,credit,,\n\
             1,2025-10-02,12.50,debit,\"Lunch, with friends\",Food\n"
        );
    }

    #[test]
    fn excludes_other_users() {
        let (connection, user) = get_test_connection();
        let other_user =
            create_user(Email::new_unchecked("other@test.com"), None, &connection).unwrap();
        create_transaction(
            Transaction::build(1.0, Kind::Credit, date!(2025 - 10 - 01)),
            other_user.id,
            &connection,
        )
        .unwrap();

        let got = export_transactions_csv(user.id, &connection).unwrap();

        assert_eq!(got.lines().count(), 1);
    }
}

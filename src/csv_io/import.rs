//! Importing transactions from an uploaded CSV file.

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartRejection},
    },
};
use csv::{ReaderBuilder, Trim};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    Error,
    category::{CategoryName, create_category, get_category_by_name},
    csv_io::CsvState,
    database_id::CategoryId,
    transaction::{Kind, Transaction, TransactionBuilder, create_transaction},
    user::UserID,
};

/// The response body of a successful import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// The number of transactions that were created.
    pub imported: usize,
}

/// A transaction read from a CSV file, before it is given an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTransaction {
    /// The transaction fields.
    pub builder: TransactionBuilder,
    /// The name of the category to file the transaction under, created if needed.
    pub category: Option<CategoryName>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    occurred_at: String,
    amount: String,
    kind: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Route handler for importing transactions from a CSV file.
///
/// The upload must be a multipart form with a file whose name ends in `.csv`.
/// Either every row is imported or none are.
pub async fn import_csv_endpoint(
    State(state): State<CsvState>,
    Extension(user_id): Extension<UserID>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportSummary>, Error> {
    let mut multipart = multipart?;
    let mut csv_text = None;

    while let Some(field) = multipart.next_field().await.map_err(|error| {
        tracing::debug!("could not read multipart field: {error}");
        Error::MultipartError(error.body_text())
    })? {
        if field.file_name().is_some() {
            csv_text = Some(read_csv_field(field).await?);
            break;
        }
    }

    let csv_text =
        csv_text.ok_or_else(|| Error::MultipartError("no file was uploaded".to_owned()))?;
    let transactions = parse_transactions_csv(&csv_text)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let imported = import_transactions(transactions, user_id, &connection)?;
    tracing::info!(%user_id, imported, "imported transactions from CSV");

    Ok(Json(ImportSummary { imported }))
}

async fn read_csv_field(field: Field<'_>) -> Result<String, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();

    if !file_name.to_lowercase().ends_with(".csv") {
        return Err(Error::NotCSV);
    }

    let data = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Parse CSV text with a header row into transactions.
///
/// `occurred_at` must be `YYYY-MM-DD`, `amount` a positive number and `kind`
/// either "credit" or "debit" in any case. `description` and `category` are
/// optional and blank values are treated as missing.
///
/// # Errors
/// Returns an [Error::InvalidCSV] naming the first row (counting from 1 after
/// the header) that could not be parsed.
pub fn parse_transactions_csv(text: &str) -> Result<Vec<CsvTransaction>, Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(index, record)| {
            let row_number = index + 1;
            let row = record.map_err(|error| Error::InvalidCSV(format!("row {row_number}: {error}")))?;

            parse_row(row).map_err(|error| Error::InvalidCSV(format!("row {row_number}: {error}")))
        })
        .collect()
}

fn parse_row(row: CsvRow) -> Result<CsvTransaction, String> {
    let occurred_at = Date::parse(&row.occurred_at, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("invalid occurred_at \"{}\": {error}", row.occurred_at))?;

    let amount: f64 = row
        .amount
        .parse()
        .map_err(|_| format!("invalid amount \"{}\"", row.amount))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(format!("amount must be a positive number, got {}", row.amount));
    }

    let kind: Kind = row.kind.parse().map_err(|error: Error| error.to_string())?;

    let category = row
        .category
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(CategoryName::new)
        .transpose()
        .map_err(|error| error.to_string())?;

    Ok(CsvTransaction {
        builder: Transaction::build(amount, kind, occurred_at)
            .description(row.description.as_deref()),
        category,
    })
}

/// Create `transactions` for `user_id`, creating any categories that do not exist yet.
///
/// The inserts run in one SQL transaction, so either all transactions are
/// created or none are.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn import_transactions(
    transactions: Vec<CsvTransaction>,
    user_id: UserID,
    connection: &Connection,
) -> Result<usize, Error> {
    let tx = connection.unchecked_transaction()?;
    let mut category_ids: HashMap<CategoryName, CategoryId> = HashMap::new();
    let mut imported = 0;

    for transaction in transactions {
        let category_id = match transaction.category {
            Some(name) => Some(match category_ids.get(&name) {
                Some(id) => *id,
                None => {
                    let id = match get_category_by_name(&name, user_id, &tx)? {
                        Some(category) => category.id,
                        None => create_category(name.clone(), user_id, &tx)?.id,
                    };
                    category_ids.insert(name, id);
                    id
                }
            }),
            None => None,
        };

        create_transaction(transaction.builder.category_id(category_id), user_id, &tx)?;
        imported += 1;
    }

    tx.commit()?;

    Ok(imported)
}

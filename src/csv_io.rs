//! Moving transactions in and out of the application as CSV files.
//!
//! Both directions use the columns `occurred_at`, `amount`, `kind`,
//! `description` and `category`. Exports also include the transaction `id`.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod export;
mod import;

pub use export::export_csv_endpoint;
pub use import::import_csv_endpoint;

/// The state needed for importing and exporting transactions.
#[derive(Debug, Clone)]
pub struct CsvState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CsvState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

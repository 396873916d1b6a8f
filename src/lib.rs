//! OFC is a small web service for tracking personal finances.
//!
//! Users record income (credit) and expense (debit) transactions, optionally
//! tagged with categories, and query a gap-filled balance-over-time series
//! grouped by day, week or month.
//!
//! This library provides a JSON REST API, CSV import/export and a WebSocket
//! feed of newly recorded transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod csv_io;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod feed;
mod logging;
mod not_found;
mod register_user;
mod routing;
mod transaction;
mod user;

pub use app_state::AppState;
pub use category::{CategoryName, create_category, get_category_by_name};
pub use dashboard::{BalancePoint, Granularity, LedgerEntry, aggregate, round_to_cents};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use feed::FeedConfig;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{Kind, Transaction, TransactionBuilder, create_transaction};
pub use user::{ApiKey, Email, User, UserID, create_user};

use crate::not_found::get_404_not_found_response;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request parameter had a value outside of its accepted set, e.g. an
    /// unknown `group_by` granularity.
    #[error("{0}")]
    InvalidArgument(String),

    /// A transaction amount was zero, negative or not a finite number.
    ///
    /// Amounts are always positive magnitudes, the transaction kind carries the sign.
    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    /// The email address used to create a user is malformed.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// A category name was empty or too long.
    #[error("invalid category name: {0}")]
    InvalidCategoryName(String),

    /// The category ID used for a transaction does not refer to one of the
    /// caller's categories.
    #[error("Invalid category_id")]
    InvalidCategory(Option<CategoryId>),

    /// The caller already has a category with the same name.
    #[error("Category with that name already exists")]
    DuplicateCategoryName,

    /// Another user is already registered with the email address.
    #[error("Email already registered")]
    DuplicateEmail,

    /// The open bootstrap endpoint was called after the first user was created.
    #[error("Users already exist. Use /users/create with a valid API key.")]
    UsersAlreadyExist,

    /// An authenticated route was called before any user was created.
    #[error("No users exist. Create one via POST /users to bootstrap.")]
    NoUsers,

    /// The request did not include the `X-API-Key` header.
    #[error("Missing X-API-Key")]
    MissingApiKey,

    /// The API key does not belong to any user.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transaction does not exist or belongs to another user.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The category does not exist or belongs to another user.
    #[error("Category not found")]
    CategoryNotFound,

    /// The uploaded file does not look like a CSV file.
    #[error("Please upload a .csv file")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// axum could not extract the request body, query string or path, e.g.
    /// because the JSON was malformed or a query parameter had the wrong type.
    #[error("{detail}")]
    RequestRejected {
        /// The status code chosen by the rejected extractor.
        status: StatusCode,
        /// The extractor's description of what went wrong.
        detail: String,
    },

    /// The multipart form could not be read.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CSVWriteError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to clients for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_)
            | Error::InvalidAmount(_)
            | Error::InvalidEmail(_)
            | Error::InvalidCategoryName(_)
            | Error::InvalidCategory(_)
            | Error::NoUsers
            | Error::NotCSV
            | Error::InvalidCSV(_)
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::RequestRejected { status, .. } => *status,
            Error::MissingApiKey | Error::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Error::UsersAlreadyExist => StatusCode::FORBIDDEN,
            Error::NotFound | Error::TransactionNotFound | Error::CategoryNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DuplicateCategoryName | Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::CSVWriteError(_) | Error::SqlError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        match self {
            Error::NotFound => get_404_not_found_response(),
            // Server side errors are not intended to be shown to the client.
            error if status_code.is_server_error() => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    status_code,
                    Json(ErrorBody {
                        detail: "Internal Server Error".to_owned(),
                    }),
                )
                    .into_response()
            }
            error => (
                status_code,
                Json(ErrorBody {
                    detail: error.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

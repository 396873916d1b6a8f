//! Route handlers for the transaction JSON API.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    extract::{JsonBody, PathParam, QueryParams},
    database_id::TransactionId,
    transaction::{
        Transaction, TransactionBuilder, TransactionFilter, TransactionPatch, count_transactions,
        create_transaction, delete_transaction, get_transaction, list_transactions,
        update_transaction,
    },
    user::UserID,
};

/// The state needed by the transaction handlers.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for recording a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(new_transaction): JsonBody<TransactionBuilder>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(new_transaction, user_id, &connection)?;
    tracing::debug!(transaction_id = transaction.id, "created transaction");

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// One page of the user's transactions.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    /// The transactions in this page.
    pub items: Vec<Transaction>,
    /// How many transactions match the filter across all pages.
    pub total: u64,
}

/// A route handler for listing the user's transactions.
///
/// Responds with a [TransactionPage] so clients can page through the results
/// with `limit` and `offset`.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    QueryParams(filter): QueryParams<TransactionFilter>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let items = list_transactions(user_id, &filter, &connection)?;
    let total = count_transactions(user_id, &filter, &connection)?;

    Ok(Json(TransactionPage { items, total }).into_response())
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParam(transaction_id): PathParam<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(transaction).into_response())
}

/// A route handler for partially updating a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParam(transaction_id): PathParam<TransactionId>,
    JsonBody(patch): JsonBody<TransactionPatch>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;
    let updated = update_transaction(
        transaction_id,
        patch.apply(&transaction),
        user_id,
        &connection,
    )?;

    Ok(Json(updated).into_response())
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParam(transaction_id): PathParam<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;
    tracing::debug!(transaction_id, "deleted transaction");

    Ok(StatusCode::NO_CONTENT.into_response())
}

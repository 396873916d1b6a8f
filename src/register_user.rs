//! Route handlers for creating users and reading the current user.
//!
//! The very first user is created through the open bootstrap route. After
//! that, new users can only be created by an authenticated user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    extract::JsonBody,
    user::{Email, UserID, count_users, create_user, get_user_by_id},
};

/// The state needed for creating and reading users.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// The user's email address.
    pub email: String,
    /// An optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A route handler for creating the first user.
///
/// Only succeeds while there are no users, so that a fresh install can be
/// bootstrapped without an API key.
pub async fn bootstrap_user(
    State(state): State<UserState>,
    JsonBody(new_user): JsonBody<NewUser>,
) -> Result<Response, Error> {
    let email = Email::new(&new_user.email)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if count_users(&connection)? > 0 {
        return Err(Error::UsersAlreadyExist);
    }

    let user = create_user(email, new_user.name.as_deref(), &connection)?;
    tracing::info!(user_id = %user.id, "bootstrapped first user");

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// A route handler for an authenticated user to create another user.
pub async fn create_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(new_user): JsonBody<NewUser>,
) -> Result<Response, Error> {
    let email = Email::new(&new_user.email)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(email, new_user.name.as_deref(), &connection)?;
    tracing::info!(created_by = %user_id, user_id = %user.id, "created user");

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// A route handler that returns the authenticated user.
pub async fn get_current_user(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;

    Ok(Json(user).into_response())
}

//! Route handlers for creating, listing and deleting categories.

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
    extract::{JsonBody, PathParam, QueryParams},
    category::{CategoryName, create_category, delete_category, list_categories},
    database_id::CategoryId,
    user::UserID,
};

/// The state needed by the category handlers.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for creating a category.
#[derive(Debug, Deserialize)]
pub struct NewCategory {
    /// The name of the new category.
    pub name: String,
}

/// The query string for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    /// Only return categories whose name starts with this text.
    pub q: Option<String>,
}

/// A route handler for creating a new category for the authenticated user.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(new_category): JsonBody<NewCategory>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&new_category.name)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(name, user_id, &connection)?;

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// A route handler for listing the authenticated user's categories.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    QueryParams(query): QueryParams<CategoryQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = list_categories(user_id, query.q.as_deref().map(str::trim), &connection)?;

    Ok(Json(categories).into_response())
}

/// A route handler for deleting one of the authenticated user's categories.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    PathParam(category_id): PathParam<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

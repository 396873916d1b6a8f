//! API key authentication.
//!
//! Clients authenticate by sending their key in the `X-API-Key` header. The
//! [auth_guard] middleware resolves the key to a [UserID] and places it into
//! the request extensions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    user::{User, count_users, get_user_by_api_key},
};

/// The header that carries the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for looking up API keys.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Find the user that owns `api_key`.
///
/// # Errors
///
/// Returns:
/// - [Error::NoUsers] if no users have been created yet,
/// - [Error::MissingApiKey] if `api_key` is `None` or blank,
/// - [Error::InvalidApiKey] if no user owns the key,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn authenticate(api_key: Option<&str>, connection: &Connection) -> Result<User, Error> {
    if count_users(connection)? == 0 {
        return Err(Error::NoUsers);
    }

    let api_key = api_key
        .map(str::trim)
        .filter(|api_key| !api_key.is_empty())
        .ok_or(Error::MissingApiKey)?;

    match get_user_by_api_key(api_key, connection) {
        Ok(user) => Ok(user),
        Err(Error::NotFound) => Err(Error::InvalidApiKey),
        Err(error) => Err(error),
    }
}

/// Middleware function that checks for a valid API key.
///
/// The user ID is placed into the request and then the request is executed
/// normally if the key is valid, otherwise an error response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, mut request: Request, next: Next) -> Response {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match authenticate(api_key, &connection) {
            Ok(user) => user,
            Err(error) => {
                tracing::debug!("rejected request to {}: {error}", request.uri().path());
                return error.into_response();
            }
        }
    };

    request.extensions_mut().insert(user.id);
    next.run(request).await
}

#[cfg(test)]
mod authenticate_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::authenticate,
        db::initialize,
        user::{Email, create_user},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    #[test]
    fn fails_when_no_users_exist() {
        let connection = get_test_connection();

        assert_eq!(authenticate(Some("abc"), &connection), Err(Error::NoUsers));
    }

    #[test]
    fn fails_on_missing_key() {
        let connection = get_test_connection();
        create_user(Email::new_unchecked("a@test.com"), None, &connection).unwrap();

        assert_eq!(authenticate(None, &connection), Err(Error::MissingApiKey));
        assert_eq!(authenticate(Some(" "), &connection), Err(Error::MissingApiKey));
    }

    #[test]
    fn fails_on_unknown_key() {
        let connection = get_test_connection();
        create_user(Email::new_unchecked("a@test.com"), None, &connection).unwrap();

        assert_eq!(
            authenticate(Some("0123456789abcdef"), &connection),
            Err(Error::InvalidApiKey)
        );
    }

    #[test]
    fn succeeds_with_valid_key() {
        let connection = get_test_connection();
        let user = create_user(Email::new_unchecked("a@test.com"), None, &connection).unwrap();

        assert_eq!(authenticate(Some(user.api_key.as_ref()), &connection), Ok(user));
    }
}

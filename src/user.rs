//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rand::RngCore;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An email address that has passed basic validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// Leading and trailing whitespace is removed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidEmail] if `raw_email` does not have some text
    /// either side of an '@'.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim();

        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(email.to_owned()))
            }
            _ => Err(Error::InvalidEmail(raw_email.to_owned())),
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted email address.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The static key a client sends in the `X-API-Key` header to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey(String);

impl ApiKey {
    /// The number of random bytes in a generated key.
    pub const BYTE_LENGTH: usize = 16;

    /// Generate a new random key of [ApiKey::BYTE_LENGTH] bytes, hex encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::BYTE_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);

        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Wrap a key received from a client or read from the database.
    pub fn new_unchecked(raw_key: &str) -> Self {
        Self(raw_key.to_owned())
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, unique across users.
    pub email: Email,
    /// An optional display name.
    pub name: Option<String>,
    /// The key the user authenticates with.
    pub api_key: ApiKey,
    /// When the user was created, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            api_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_user_api_key ON user(api_key);",
    )?;

    Ok(())
}

/// Create and insert a new user with a freshly generated API key.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if `email` is already registered,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(email: Email, name: Option<&str>, connection: &Connection) -> Result<User, Error> {
    let api_key = ApiKey::generate();
    let name = name.map(str::trim).filter(|name| !name.is_empty());

    connection
        .prepare(
            "INSERT INTO user (email, name, api_key, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, email, name, api_key, created_at",
        )?
        .query_row(
            (
                email.as_ref(),
                name,
                api_key.as_ref(),
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            error => error.into(),
        })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, api_key, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user that owns `api_key`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no user has the key, or an
/// [Error::SqlError] if an SQL related error occurred.
pub fn get_user_by_api_key(api_key: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, api_key, created_at FROM user WHERE api_key = :api_key")?
        .query_row(&[(":api_key", api_key)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    Ok(count as usize)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let raw_api_key: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: Email::new_unchecked(&raw_email),
        name: row.get(2)?,
        api_key: ApiKey::new_unchecked(&raw_api_key),
        created_at: row.get(4)?,
    })
}

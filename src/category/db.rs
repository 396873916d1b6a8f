//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryName},
    database_id::CategoryId,
    user::UserID,
};

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
/// Returns an [Error::DuplicateCategoryName] if the user already has a
/// category called `name`, or an [Error::SqlError] for other SQL errors.
pub fn create_category(
    name: CategoryName,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (name, user_id, created_at) VALUES (?1, ?2, ?3)
             RETURNING id, name, user_id, created_at",
        )?
        .query_row(
            (name.as_ref(), user_id.as_i64(), OffsetDateTime::now_utc()),
            map_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateCategoryName
            }
            error => error.into(),
        })
}

/// Retrieve one of `user_id`'s categories by ID.
///
/// # Errors
/// Returns an [Error::CategoryNotFound] if the category does not exist or
/// belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, user_id, created_at FROM category
             WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound,
            error => error.into(),
        })
}

/// Retrieve one of `user_id`'s categories by its exact name, if it exists.
pub fn get_category_by_name(
    name: &CategoryName,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    let mut stmt = connection.prepare(
        "SELECT id, name, user_id, created_at FROM category
         WHERE user_id = ?1 AND name = ?2",
    )?;
    let mut rows = stmt.query_map((user_id.as_i64(), name.as_ref()), map_row)?;

    rows.next().transpose().map_err(|error| error.into())
}

/// Retrieve all of `user_id`'s categories ordered by name.
///
/// If `starts_with` is given, only categories whose name starts with it
/// (ignoring ASCII case) are returned.
pub fn list_categories(
    user_id: UserID,
    starts_with: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let pattern = starts_with
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| format!("{}%", escape_like_pattern(prefix)));

    connection
        .prepare(
            "SELECT id, name, user_id, created_at FROM category
             WHERE user_id = ?1 AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\')
             ORDER BY name ASC, id ASC",
        )?
        .query_map((user_id.as_i64(), pattern), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete one of `user_id`'s categories.
///
/// Transactions in the category are kept and become uncategorised.
///
/// # Errors
/// Returns an [Error::CategoryNotFound] if the category does not exist or
/// belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::CategoryNotFound);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_name ON category(user_id, name);",
    )?;

    Ok(())
}

fn escape_like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        user_id: UserID::new(row.get(2)?),
        created_at: row.get(3)?,
    })
}

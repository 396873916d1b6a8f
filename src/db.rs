//! Sets up the application's SQLite database.

use rusqlite::Connection;

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all of the database tables for the application.
///
/// Foreign key enforcement is switched on for `connection`. Tables that already
/// exist are left untouched, so this is safe to call on every start up.
///
/// # Errors
/// This function may return a [Error::SqlError] if there was an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    fn count_tables(connection: &Connection) -> i64 {
        connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('user', 'category', 'transaction')",
                [],
                |row| row.get(0),
            )
            .expect("Could not count tables")
    }

    #[test]
    fn creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");

        assert_eq!(count_tables(&connection), 3);
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");
        initialize(&connection).expect("Could not initialize database twice");

        assert_eq!(count_tables(&connection), 3);
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");

        let enabled: i64 = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}

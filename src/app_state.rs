//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, feed::FeedConfig};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// Controls how often the transaction feed checks for new transactions.
    pub feed_config: FeedConfig,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, feed_config: FeedConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            feed_config,
        })
    }
}

#[cfg(test)]
mod app_state_tests {
    use std::time::Duration;

    use rusqlite::Connection;

    use crate::{AppState, FeedConfig};

    #[test]
    fn new_initializes_database() {
        let connection = Connection::open_in_memory().unwrap();

        let state = AppState::new(
            connection,
            FeedConfig {
                poll_interval: Duration::from_millis(10),
            },
        )
        .expect("Could not create app state");

        let connection = state.db_connection.lock().unwrap();
        let user_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))
            .expect("user table should exist");
        assert_eq!(user_count, 0);
    }
}

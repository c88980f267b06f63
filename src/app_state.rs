//! The shared state handed to every route handler.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// Everything the API handlers share.
///
/// Handlers take narrower state structs that are built from this one with
/// `FromRef`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Canonical name of the household's timezone, e.g. "Pacific/Auckland".
    ///
    /// Decides which date is "today" when seeding rules.
    pub local_timezone: String,

    /// Page size defaults and limits for list endpoints.
    pub pagination_config: PaginationConfig,

    /// The single SQLite connection, one writer at a time.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wrap `db_connection` for sharing after creating any missing tables.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

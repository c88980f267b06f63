//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::Date;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A month number outside of 1 to 12 was given.
    #[error("{0} is not a valid month, expected a number from 1 to 12")]
    InvalidMonth(u8),

    /// A date could not be constructed or is outside the supported range.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// An end date came before its start date.
    #[error("the end date {end} is before the start date {start}")]
    InvalidDateRange {
        /// The start of the range.
        start: Date,
        /// The end of the range, which was earlier than `start`.
        end: Date,
    },

    /// A request contained a value that failed validation.
    ///
    /// The string describes which field was invalid and why, and is safe to
    /// show to the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A ledger entry was moved into a month where its recurring rule or
    /// financing agreement already has an entry.
    #[error("the obligation already has a transaction in that month")]
    DuplicateOccurrence,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a recurring rule that does not exist
    #[error("tried to update a recurring rule that is not in the database")]
    UpdateMissingRecurring,

    /// Tried to delete a recurring rule that does not exist
    #[error("tried to delete a recurring rule that is not in the database")]
    DeleteMissingRecurring,

    /// Tried to update a financing agreement that does not exist
    #[error("tried to update a financing agreement that is not in the database")]
    UpdateMissingFinancing,

    /// Tried to delete a financing agreement that does not exist
    #[error("tried to delete a financing agreement that is not in the database")]
    DeleteMissingFinancing,
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

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidMonth(_)
            | Error::InvalidDate(_)
            | Error::InvalidDateRange { .. }
            | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingRecurring
            | Error::DeleteMissingRecurring
            | Error::UpdateMissingFinancing
            | Error::DeleteMissingFinancing => StatusCode::NOT_FOUND,
            Error::DuplicateOccurrence => StatusCode::CONFLICT,
            Error::SqlError(_) | Error::DatabaseLockError | Error::InvalidTimezoneError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(
            Error::InvalidMonth(13).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidInput("name cannot be empty".to_owned())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_entities_are_not_found() {
        assert_eq!(
            Error::UpdateMissingTransaction.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::DeleteMissingFinancing.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn duplicate_occurrence_is_conflict() {
        assert_eq!(
            Error::DuplicateOccurrence.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn lock_error_is_internal() {
        assert_eq!(
            Error::DatabaseLockError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    database_id::RecurringId,
    recurring::{db::delete_recurring_rule, models::RecurringState},
};

/// A route handler for deleting a recurring rule.
///
/// Entries created from the rule stay in the ledger.
pub async fn delete_recurring_endpoint(
    Path(rule_id): Path<RecurringId>,
    State(state): State<RecurringState>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_recurring_rule(rule_id, &connection) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(Error::DeleteMissingRecurring) => Err(Error::DeleteMissingRecurring),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting recurring rule {rule_id}: {error}"
            );
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::delete};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        recurring::{NewRecurringRule, create_recurring_rule, models::RecurringState},
        transaction::TransactionType,
    };

    use super::delete_recurring_endpoint;

    #[tokio::test]
    async fn delete_returns_no_content_then_not_found() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let rule = create_recurring_rule(
            &NewRecurringRule::new("Gym", TransactionType::Expense, "Health", 40.0),
            &connection,
        )
        .unwrap();
        let app = Router::new()
            .route(endpoints::RECURRING, delete(delete_recurring_endpoint))
            .with_state(RecurringState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            });
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let path = endpoints::format_endpoint(endpoints::RECURRING, rule.id);

        server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        server.delete(&path).await.assert_status_not_found();
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{core::delete_transaction, models::TransactionState},
};

/// A route handler for deleting a transaction.
///
/// Deleting an entry that came from a recurring rule or financing agreement
/// does not stop it from being materialized again for that month.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, &connection)
        .inspect_err(|error| tracing::error!("could not delete transaction {transaction_id}: {error}"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::delete};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints,
        pagination::PaginationConfig,
        transaction::{
            Transaction, TransactionType, count_transactions, create_transaction,
            models::TransactionState,
        },
    };

    use super::delete_transaction_endpoint;

    #[tokio::test]
    async fn delete_returns_no_content_then_not_found() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let transaction = create_transaction(
            Transaction::build(TransactionType::Income, date!(2025 - 05 - 01), "Salary"),
            &connection,
        )
        .unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
        };
        let app = Router::new()
            .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
            .with_state(state.clone());
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let path = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);

        server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        server.delete(&path).await.assert_status_not_found();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }
}

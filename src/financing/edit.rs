use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    database_id::FinancingId,
    financing::{
        db::{delete_financing, get_financing, update_financing},
        models::{Financing, FinancingPatch, FinancingState},
    },
};

/// A route handler for a partial update of a financing agreement.
///
/// Installments already in the ledger keep their old values.
pub async fn update_financing_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
    Json(patch): Json<FinancingPatch>,
) -> Result<Json<Financing>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let financing = match get_financing(financing_id, &connection) {
        Ok(financing) => financing,
        Err(Error::NotFound) => return Err(Error::UpdateMissingFinancing),
        Err(error) => return Err(error),
    };

    update_financing(financing_id, &patch.apply(financing)?, &connection)
        .inspect_err(|error| {
            tracing::error!("could not update financing agreement {financing_id}: {error}")
        })
        .map(Json)
}

/// A route handler for deleting a financing agreement.
///
/// Installments already in the ledger stay there.
pub async fn delete_financing_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_financing(financing_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::put};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints,
        financing::{
            db::create_financing,
            models::{Financing, FinancingState, NewFinancing},
        },
    };

    use super::{delete_financing_endpoint, update_financing_endpoint};

    fn get_test_server() -> (TestServer, Financing) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let financing = create_financing(
            &NewFinancing {
                account: Some("Checking".to_owned()),
                ..NewFinancing::new("Car", 500.0, 24, date!(2024 - 01 - 15))
            },
            &connection,
        )
        .unwrap();
        let app = Router::new()
            .route(
                endpoints::FINANCING,
                put(update_financing_endpoint).delete(delete_financing_endpoint),
            )
            .with_state(FinancingState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            });

        (
            TestServer::try_new(app).expect("Could not create test server."),
            financing,
        )
    }

    #[tokio::test]
    async fn update_changes_given_fields() {
        let (server, financing) = get_test_server();

        let response = server
            .put(&endpoints::format_endpoint(endpoints::FINANCING, financing.id))
            .json(&json!({ "description": "Family car", "account": null }))
            .await;

        response.assert_status_ok();
        let updated: Financing = response.json();
        assert_eq!(updated.name, "Family car");
        assert_eq!(updated.account, None);
        assert_eq!(updated.installment_amount, 500.0);
    }

    #[tokio::test]
    async fn update_missing_financing_is_not_found() {
        let (server, _) = get_test_server();

        server
            .put(&endpoints::format_endpoint(endpoints::FINANCING, 999))
            .json(&json!({ "description": "Boat" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_returns_no_content_then_not_found() {
        let (server, financing) = get_test_server();
        let path = endpoints::format_endpoint(endpoints::FINANCING, financing.id);

        server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        server.delete(&path).await.assert_status_not_found();
    }
}

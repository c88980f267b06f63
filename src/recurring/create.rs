use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    materialize::{DEFAULT_MONTHS_AHEAD, seed_forward},
    recurring::{
        db::create_recurring_rule,
        models::{RecurringForm, RecurringState},
    },
    timezone::local_today,
};

/// A route handler for creating a recurring rule.
///
/// The new rule is seeded [DEFAULT_MONTHS_AHEAD] months ahead so its upcoming
/// entries show up right away. A failure to seed is logged but does not fail
/// the request since the months are filled in when they are first read.
pub async fn create_recurring_endpoint(
    State(state): State<RecurringState>,
    Json(form): Json<RecurringForm>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let new_rule = form.into_new_rule(today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = create_recurring_rule(&new_rule, &connection)
        .inspect_err(|error| tracing::error!("could not create recurring rule: {error}"))?;

    if let Err(error) = seed_forward(&rule, DEFAULT_MONTHS_AHEAD, today, &connection) {
        tracing::error!("could not seed recurring rule {}: {error}", rule.id);
    }

    Ok((StatusCode::CREATED, Json(rule)).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        calendar::YearMonth,
        db::initialize,
        endpoints,
        materialize::ensure_month,
        recurring::{RecurringRule, models::RecurringState},
        timezone::local_today,
        transaction::count_transactions,
    };

    use super::create_recurring_endpoint;

    fn get_test_state() -> RecurringState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        RecurringState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn get_test_server(state: RecurringState) -> TestServer {
        let app = Router::new()
            .route(endpoints::RECURRING_API, post(create_recurring_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_rule_seeds_entries() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::RECURRING_API)
            .json(&json!({
                "type": "EXPENSE",
                "category": "Housing",
                "description": "Rent",
                "amount": 1200.0,
                "dayOfMonth": 5,
                "startDate": "2024-01-01",
                "installments": 6
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let rule: RecurringRule = response.json();
        assert_eq!(rule.name, "Rent");
        assert_eq!(rule.day_of_month, Some(5));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(6));
    }

    #[tokio::test]
    async fn create_rule_with_installments_and_no_start_starts_this_month() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let today = local_today("Etc/UTC").unwrap();

        let response = server
            .post(endpoints::RECURRING_API)
            .json(&json!({
                "type": "EXPENSE",
                "category": "Health",
                "description": "Gym",
                "amount": 40.0,
                "installments": 2
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let rule: RecurringRule = response.json();
        assert_eq!(rule.start_date, Some(YearMonth::of(today).first_day().unwrap()));
        let connection = state.db_connection.lock().unwrap();
        for offset in 0..6 {
            ensure_month(YearMonth::of(today).add_months(offset), &connection).unwrap();
        }
        assert_eq!(count_transactions(&connection), Ok(2));
    }

    #[tokio::test]
    async fn create_rule_without_name_uses_type_and_category() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::RECURRING_API)
            .json(&json!({
                "type": "INCOME",
                "category": "Salary",
                "amount": 5000.0
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let rule: RecurringRule = response.json();
        assert_eq!(rule.name, "INCOME - Salary");
    }

    #[tokio::test]
    async fn create_rule_with_invalid_day_is_bad_request() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::RECURRING_API)
            .json(&json!({
                "type": "EXPENSE",
                "category": "Housing",
                "amount": 1200.0,
                "dayOfMonth": 0
            }))
            .await;

        response.assert_status_bad_request();
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(0));
    }
}

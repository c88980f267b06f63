//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::json;

use crate::{
    AppState, endpoints,
    financing::{
        create_financing_endpoint, delete_financing_endpoint, early_payment_endpoint,
        get_financing_endpoint, get_financing_payments_endpoint, get_financing_stats_endpoint,
        list_financing_endpoint, pay_financing_endpoint, simulate_early_payment_endpoint,
        update_financing_endpoint,
    },
    recurring::{
        create_recurring_endpoint, delete_recurring_endpoint, get_recurring_endpoint,
        list_recurring_endpoint, toggle_recurring_endpoint, update_recurring_endpoint,
    },
    report::{
        category_report_endpoint, dashboard_endpoint, monthly_report_endpoint,
        transaction_stats_endpoint,
    },
    transaction::{
        cancel_transaction_endpoint, create_transaction_endpoint, delete_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint, pay_transaction_endpoint,
        recent_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let transaction_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::RECENT_TRANSACTIONS,
            get(recent_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION_STATS, get(transaction_stats_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::PAY_TRANSACTION, patch(pay_transaction_endpoint))
        .route(
            endpoints::CANCEL_TRANSACTION,
            patch(cancel_transaction_endpoint),
        );

    let recurring_routes = Router::new()
        .route(
            endpoints::RECURRING_API,
            get(list_recurring_endpoint).post(create_recurring_endpoint),
        )
        .route(
            endpoints::RECURRING,
            get(get_recurring_endpoint)
                .put(update_recurring_endpoint)
                .delete(delete_recurring_endpoint),
        )
        .route(endpoints::TOGGLE_RECURRING, patch(toggle_recurring_endpoint));

    let financing_routes = Router::new()
        .route(
            endpoints::FINANCING_API,
            get(list_financing_endpoint).post(create_financing_endpoint),
        )
        .route(endpoints::FINANCING_STATS, get(get_financing_stats_endpoint))
        .route(
            endpoints::FINANCING,
            get(get_financing_endpoint)
                .put(update_financing_endpoint)
                .delete(delete_financing_endpoint),
        )
        .route(
            endpoints::FINANCING_PAYMENTS,
            get(get_financing_payments_endpoint),
        )
        .route(endpoints::PAY_FINANCING, post(pay_financing_endpoint))
        .route(
            endpoints::SIMULATE_EARLY_PAYMENT,
            post(simulate_early_payment_endpoint),
        )
        .route(endpoints::EARLY_PAYMENT, post(early_payment_endpoint));

    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::MONTHLY_REPORT, get(monthly_report_endpoint))
        .route(endpoints::DASHBOARD_REPORT, get(dashboard_endpoint))
        .route(endpoints::CATEGORY_REPORT, get(category_report_endpoint))
        .merge(transaction_routes)
        .merge(recurring_routes)
        .merge(financing_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Reports that the server is up.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested route does not exist" })),
    )
        .into_response()
}

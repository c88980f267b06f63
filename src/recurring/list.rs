use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::RecurringId,
    recurring::{
        db::{get_all_recurring_rules, get_recurring_rule},
        models::{RecurringRule, RecurringState},
    },
};

/// A route handler for listing all recurring rules, newest first.
pub async fn list_recurring_endpoint(
    State(state): State<RecurringState>,
) -> Result<Json<Vec<RecurringRule>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_recurring_rules(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve recurring rules: {error}"))
        .map(Json)
}

/// A route handler for getting a single recurring rule.
pub async fn get_recurring_endpoint(
    Path(rule_id): Path<RecurringId>,
    State(state): State<RecurringState>,
) -> Result<Json<RecurringRule>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_recurring_rule(rule_id, &connection).map(Json)
}

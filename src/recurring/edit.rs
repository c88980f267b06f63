use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::RecurringId,
    materialize::{DEFAULT_MONTHS_AHEAD, seed_forward},
    recurring::{
        db::{get_recurring_rule, set_recurring_rule_active, update_recurring_rule},
        models::{RecurringPatch, RecurringRule, RecurringState, ToggleForm},
    },
    timezone::local_today,
};

/// A route handler for a partial update of a recurring rule.
///
/// Entries that are already in the ledger keep their old values. Months that
/// the updated rule now covers are seeded, as for a new rule.
pub async fn update_recurring_endpoint(
    Path(rule_id): Path<RecurringId>,
    State(state): State<RecurringState>,
    Json(patch): Json<RecurringPatch>,
) -> Result<Json<RecurringRule>, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = match get_recurring_rule(rule_id, &connection) {
        Ok(rule) => rule,
        Err(Error::NotFound) => return Err(Error::UpdateMissingRecurring),
        Err(error) => return Err(error),
    };

    let updated = update_recurring_rule(rule_id, &patch.apply(rule, today)?, &connection)
        .inspect_err(|error| tracing::error!("could not update recurring rule {rule_id}: {error}"))?;

    if let Err(error) = seed_forward(&updated, DEFAULT_MONTHS_AHEAD, today, &connection) {
        tracing::error!("could not seed recurring rule {rule_id}: {error}");
    }

    Ok(Json(updated))
}

/// A route handler for activating or deactivating a recurring rule.
///
/// Inactive rules are skipped by the month materializer. Entries already in the
/// ledger are not removed.
pub async fn toggle_recurring_endpoint(
    Path(rule_id): Path<RecurringId>,
    State(state): State<RecurringState>,
    Json(form): Json<ToggleForm>,
) -> Result<Json<RecurringRule>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    set_recurring_rule_active(rule_id, form.is_active, &connection).map(Json)
}

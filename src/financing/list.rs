use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::FinancingId,
    financing::{
        db::{get_all_financings, get_financing, get_financing_stats},
        models::{Financing, FinancingState, FinancingStats},
        payment::{Installment, installment_schedule},
    },
    timezone::local_today,
};

/// A route handler for listing all financing agreements, newest first.
pub async fn list_financing_endpoint(
    State(state): State<FinancingState>,
) -> Result<Json<Vec<Financing>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_financings(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve financing agreements: {error}"))
        .map(Json)
}

/// A route handler for totals across all financing agreements.
pub async fn get_financing_stats_endpoint(
    State(state): State<FinancingState>,
) -> Result<Json<FinancingStats>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_financing_stats(&connection).map(Json)
}

/// A route handler for getting a single financing agreement.
pub async fn get_financing_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
) -> Result<Json<Financing>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_financing(financing_id, &connection).map(Json)
}

/// A route handler for the installment schedule of a financing agreement.
pub async fn get_financing_payments_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
) -> Result<Json<Vec<Installment>>, Error> {
    let today = local_today(&state.local_timezone)?;

    let financing = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_financing(financing_id, &connection)?
    };

    installment_schedule(&financing, today).map(Json)
}

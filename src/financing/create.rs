use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    financing::{
        db::create_financing,
        models::{FinancingForm, FinancingState},
    },
};

/// A route handler for creating a financing agreement.
///
/// Installments are not written to the ledger here; each month picks them up
/// when it is first read.
pub async fn create_financing_endpoint(
    State(state): State<FinancingState>,
    Json(form): Json<FinancingForm>,
) -> Result<Response, Error> {
    let new_financing = form.into_new_financing()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let financing = create_financing(&new_financing, &connection)
        .inspect_err(|error| tracing::error!("could not create financing agreement: {error}"))?;

    Ok((StatusCode::CREATED, Json(financing)).into_response())
}

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::FinancingId,
    financing::{
        db::get_financing,
        models::{Financing, FinancingState},
        payment::{
            EarlyPaymentForm, EarlyPaymentSimulation, Installment, PaymentForm,
            apply_early_payment, pay_installment, simulate_early_payment,
        },
    },
    timezone::local_today,
};

/// A route handler for paying an installment of a financing agreement.
pub async fn pay_financing_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
    Json(form): Json<PaymentForm>,
) -> Result<Json<Installment>, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    pay_installment(financing_id, &form, today, &connection).map(Json)
}

/// A route handler for estimating the effect of an early payment.
pub async fn simulate_early_payment_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
    Json(form): Json<EarlyPaymentForm>,
) -> Result<Json<EarlyPaymentSimulation>, Error> {
    let financing = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_financing(financing_id, &connection)?
    };

    simulate_early_payment(&financing, form.amount).map(Json)
}

/// A route handler for making an early payment.
pub async fn early_payment_endpoint(
    Path(financing_id): Path<FinancingId>,
    State(state): State<FinancingState>,
    Json(form): Json<EarlyPaymentForm>,
) -> Result<Json<Financing>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    apply_early_payment(financing_id, form.amount, &connection).map(Json)
}

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        core::{
            Transaction, cancel_transaction, get_transaction, pay_transaction, update_transaction,
        },
        models::{PayForm, TransactionPatch, TransactionState},
    },
};

/// A route handler for a partial update of a transaction.
///
/// Changing the date moves the entry into the month of the new date. Moving an
/// entry into a month where its obligation already has an entry is a conflict.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
    Json(patch): Json<TransactionPatch>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = match get_transaction(transaction_id, &connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    update_transaction(transaction_id, &patch.apply(transaction)?, &connection)
        .inspect_err(|error| {
            tracing::error!("could not update transaction {transaction_id}: {error}")
        })
        .map(Json)
}

/// A route handler for marking a transaction as paid.
///
/// The body is optional. Without an amount, the amount already on the entry
/// is kept, falling back to the planned amount.
pub async fn pay_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
    body: Bytes,
) -> Result<Json<Transaction>, Error> {
    let form = if body.is_empty() {
        PayForm::default()
    } else {
        serde_json::from_slice::<PayForm>(&body)
            .map_err(|error| Error::InvalidInput(format!("invalid payment: {error}")))?
    };
    let amount = form.amount;

    if amount.is_some_and(|amount| !amount.is_finite()) {
        return Err(Error::InvalidInput("amount must be a finite number".to_owned()));
    }

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    pay_transaction(transaction_id, amount, &connection).map(Json)
}

/// A route handler for cancelling a transaction.
pub async fn cancel_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    cancel_transaction(transaction_id, &connection).map(Json)
}

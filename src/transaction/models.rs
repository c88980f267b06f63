//! Request and response bodies for the transaction endpoints.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    database_id::{FinancingId, RecurringId},
    nullable::deserialize_nullable,
    pagination::PaginationConfig,
};

use super::{
    core::{Transaction, TransactionBuilder, TransactionStatus, TransactionType},
    query::TransactionFilter,
};

/// Unified state for all transaction operations.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string for listing transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub status: Option<TransactionStatus>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListTransactionsQuery {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            year: self.year,
            month: self.month,
            transaction_type: self.transaction_type,
            category: self.category.clone(),
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// One page of transactions and where it sits in the full result set.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub limit: u64,
}

/// Request body for creating a transaction.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    pub date: Date,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub planned_amount: Option<f64>,
    pub amount: Option<f64>,
    pub account: Option<String>,
    #[serde(default)]
    pub is_fixed: bool,
    pub status: Option<TransactionStatus>,
    pub recurring_id: Option<RecurringId>,
    pub financing_id: Option<FinancingId>,
}

impl TransactionForm {
    /// Validate the form and convert it into a [TransactionBuilder].
    ///
    /// # Errors
    /// Returns [Error::InvalidInput] if the category is empty or an amount is
    /// not a finite number.
    pub fn into_builder(self) -> Result<TransactionBuilder, Error> {
        let builder = TransactionBuilder {
            transaction_type: self.transaction_type,
            date: self.date,
            category: self.category,
            description: self.description,
            planned_amount: self.planned_amount,
            amount: self.amount,
            account: self.account,
            is_fixed: self.is_fixed,
            status: self.status.unwrap_or(TransactionStatus::Planned),
            recurring_id: self.recurring_id,
            financing_id: self.financing_id,
        };

        validate_builder(&builder)?;

        Ok(builder)
    }
}

/// Request body for a partial update of a transaction.
///
/// Absent fields are left unchanged. For optional fields, `null` clears the
/// value.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub date: Option<Date>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub planned_amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub amount: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub account: Option<Option<String>>,
    pub is_fixed: Option<bool>,
    pub status: Option<TransactionStatus>,
}

impl TransactionPatch {
    /// Apply the patch on top of `transaction`.
    ///
    /// The links to a recurring rule or financing agreement are kept.
    ///
    /// # Errors
    /// Returns [Error::InvalidInput] if the result is not a valid transaction.
    pub fn apply(self, transaction: Transaction) -> Result<TransactionBuilder, Error> {
        let builder = TransactionBuilder {
            transaction_type: self
                .transaction_type
                .unwrap_or(transaction.transaction_type),
            date: self.date.unwrap_or(transaction.date),
            category: self.category.unwrap_or(transaction.category),
            description: self.description.unwrap_or(transaction.description),
            planned_amount: self
                .planned_amount
                .unwrap_or(transaction.planned_amount),
            amount: self.amount.unwrap_or(transaction.amount),
            account: self.account.unwrap_or(transaction.account),
            is_fixed: self.is_fixed.unwrap_or(transaction.is_fixed),
            status: self.status.unwrap_or(transaction.status),
            recurring_id: transaction.recurring_id,
            financing_id: transaction.financing_id,
        };

        validate_builder(&builder)?;

        Ok(builder)
    }
}

/// Request body for marking a transaction as paid.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PayForm {
    /// The amount that was paid, if different from what is on the entry.
    #[serde(default)]
    pub amount: Option<f64>,
}

fn validate_builder(builder: &TransactionBuilder) -> Result<(), Error> {
    if builder.category.trim().is_empty() {
        return Err(Error::InvalidInput("category cannot be empty".to_owned()));
    }

    let amounts = [builder.planned_amount, builder.amount];
    if amounts.iter().flatten().any(|amount| !amount.is_finite()) {
        return Err(Error::InvalidInput("amounts must be finite numbers".to_owned()));
    }

    Ok(())
}

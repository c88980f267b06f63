//! Transaction management for the finance planner.
//!
//! This module contains everything related to ledger entries:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - The JSON route handlers for the transactions API

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod models;
mod query;

pub use core::{
    Transaction, TransactionBuilder, TransactionStatus, TransactionType, create_transaction,
    create_transaction_table, insert_transaction_if_absent,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::{
    cancel_transaction_endpoint, pay_transaction_endpoint, update_transaction_endpoint,
};
pub use list_endpoint::{
    get_transaction_endpoint, list_transactions_endpoint, recent_transactions_endpoint,
};

pub(crate) use core::{TRANSACTION_COLUMNS, map_transaction_row};
pub(crate) use query::{TransactionFilter, query_transactions};

#[cfg(test)]
pub use core::{
    cancel_transaction, count_transactions, delete_transaction, get_transaction,
    pay_transaction, update_transaction,
};

//! Financing agreements: loans and purchases paid off in fixed monthly installments.
//!
//! Active agreements are materialized into the ledger as one expense per month,
//! see [crate::materialize].

mod create;
mod db;
mod edit;
mod list;
mod models;
mod pay;
mod payment;

pub use create::create_financing_endpoint;
pub use db::{create_financing, create_financing_table, get_active_financings};
pub use edit::{delete_financing_endpoint, update_financing_endpoint};
pub use list::{
    get_financing_endpoint, get_financing_payments_endpoint, get_financing_stats_endpoint,
    list_financing_endpoint,
};
pub use models::{Financing, FinancingKind, NewFinancing};
pub use pay::{early_payment_endpoint, pay_financing_endpoint, simulate_early_payment_endpoint};

//! Recurring rules: incomes and expenses that repeat every month.
//!
//! Rules are materialized into the ledger month by month, see
//! [crate::materialize].

mod create;
mod db;
mod delete;
mod edit;
mod list;
mod models;

pub use create::create_recurring_endpoint;
pub use db::{create_recurring_rule, create_recurring_rule_table, get_active_recurring_rules};
pub use delete::delete_recurring_endpoint;
pub use edit::{toggle_recurring_endpoint, update_recurring_endpoint};
pub use list::{get_recurring_endpoint, list_recurring_endpoint};
pub use models::{NewRecurringRule, RecurringRule};

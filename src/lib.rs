//! Planeteur is a household finance planner.
//!
//! Recurring incomes and expenses and the installments of financing agreements
//! are turned into planned ledger entries month by month. Planned entries are
//! marked as paid once their date arrives, and each month can be reported as
//! planned versus actual.
//!
//! This library provides the JSON REST API and the daily auto-pay scheduler.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auto_pay;
mod calendar;
mod database_id;
mod db;
mod endpoints;
mod error;
mod financing;
mod logging;
mod materialize;
mod nullable;
mod pagination;
mod recurring;
mod report;
mod routing;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use auto_pay::{AutoPayConfig, AutoPayScheduler, sweep_due_transactions};
pub use calendar::YearMonth;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use financing::{Financing, FinancingKind, NewFinancing, create_financing};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use materialize::{DEFAULT_MONTHS_AHEAD, ensure_month, seed_forward};
pub use pagination::PaginationConfig;
pub use recurring::{NewRecurringRule, RecurringRule, create_recurring_rule};
pub use report::{MonthlyReport, monthly_report};
pub use routing::build_router;
pub use timezone::local_today;
pub use transaction::{
    Transaction, TransactionBuilder, TransactionStatus, TransactionType, create_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

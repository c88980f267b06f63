use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    calendar::YearMonth,
    materialize::ensure_month,
    report::monthly::{MonthlyReport, monthly_report},
};

/// The state needed for the monthly report.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub year: i32,
    pub month: u8,
}

/// A route handler for the planned versus actual report of one month.
///
/// The month is materialized first so that every active obligation is counted.
pub async fn monthly_report_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<MonthlyReport>, Error> {
    let year_month = YearMonth::new(query.year, query.month)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_month(year_month, &connection)
        .inspect_err(|error| tracing::error!("could not materialize {year_month}: {error}"))?;

    monthly_report(year_month, &connection).map(Json)
}

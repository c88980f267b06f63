use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    calendar::YearMonth,
    materialize::ensure_month,
    report::{
        dashboard::{
            CategoryReport, Dashboard, TransactionStats, category_report, chart_months, dashboard,
            transaction_stats,
        },
        period::{Period, PeriodQuery, resolve_period},
    },
    timezone::local_today,
    transaction::TransactionType,
};

/// The state needed for reports that are relative to today.
#[derive(Debug, Clone)]
pub struct SummaryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string for the category report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReportQuery {
    #[serde(default)]
    pub period: Period,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
}

/// A route handler for the dashboard totals, chart and recent transactions.
pub async fn dashboard_endpoint(
    State(state): State<SummaryState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Dashboard>, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = query.date_range(today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let months: BTreeSet<YearMonth> = range
        .months()
        .into_iter()
        .chain(chart_months(YearMonth::of(today)))
        .collect();
    ensure_months(&months, &connection)?;

    dashboard(range, today, &connection).map(Json)
}

/// A route handler for totals per category and type.
pub async fn category_report_endpoint(
    State(state): State<SummaryState>,
    Query(query): Query<CategoryReportQuery>,
) -> Result<Json<Vec<CategoryReport>>, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = resolve_period(query.period, query.start_date, query.end_date, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_months(&range.months(), &connection)?;

    category_report(range, query.transaction_type, &connection).map(Json)
}

/// A route handler for income and expense totals from the start of a period up to today.
pub async fn transaction_stats_endpoint(
    State(state): State<SummaryState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<TransactionStats>, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = query.date_range(today)?.until(today);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_months(&range.months(), &connection)?;

    transaction_stats(range, &connection).map(Json)
}

fn ensure_months<'a>(
    months: impl IntoIterator<Item = &'a YearMonth>,
    connection: &Connection,
) -> Result<(), Error> {
    for &year_month in months {
        ensure_month(year_month, connection)
            .inspect_err(|error| tracing::error!("could not materialize {year_month}: {error}"))?;
    }

    Ok(())
}

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    Error,
    calendar::YearMonth,
    database_id::TransactionId,
    materialize::ensure_month,
    pagination::{Page, page_count},
    transaction::{
        core::{Transaction, get_transaction},
        models::{ListTransactionsQuery, TransactionPage, TransactionState},
        query::{TransactionFilter, count_filtered_transactions, query_transactions},
    },
};

/// The number of recent transactions returned when no limit is given.
const DEFAULT_RECENT_LIMIT: u64 = 10;
/// The most recent transactions returned at once.
const MAX_RECENT_LIMIT: u64 = 50;

/// The query string for the recent transactions.
#[derive(Debug, Default, Deserialize)]
pub struct RecentTransactionsQuery {
    pub limit: Option<u64>,
}

/// A route handler for listing transactions with filters and pagination.
///
/// When both `year` and `month` are given, the month is materialized first so
/// that the listing includes every active obligation.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionPage>, Error> {
    let page = state.pagination_config.resolve(query.page, query.limit);
    let filter = query.filter();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if let (Some(year), Some(month)) = (filter.year, filter.month) {
        let year_month = YearMonth::new(year, month)?;
        ensure_month(year_month, &connection)
            .inspect_err(|error| tracing::error!("could not materialize {year_month}: {error}"))?;
    }

    let transactions = query_transactions(&filter, page, &connection)
        .inspect_err(|error| tracing::error!("could not query transactions: {error}"))?;
    let total = count_filtered_transactions(&filter, &connection)?;

    Ok(Json(TransactionPage {
        transactions,
        total,
        page: page.number,
        total_pages: page_count(total, page.size),
        limit: page.size,
    }))
}

/// A route handler for the newest transactions across the whole ledger.
///
/// A missing or zero limit returns [DEFAULT_RECENT_LIMIT] transactions, and
/// larger limits are capped at [MAX_RECENT_LIMIT].
pub async fn recent_transactions_endpoint(
    State(state): State<TransactionState>,
    Query(query): Query<RecentTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let size = query
        .limit
        .filter(|&limit| limit > 0)
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    query_transactions(
        &TransactionFilter::default(),
        Page { number: 1, size },
        &connection,
    )
    .map(Json)
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::{Duration, macros::date};

    use crate::{
        db::initialize,
        endpoints,
        pagination::PaginationConfig,
        recurring::{NewRecurringRule, create_recurring_rule},
        transaction::{
            Transaction, TransactionType, create_transaction,
            models::{TransactionPage, TransactionState},
        },
    };

    use super::{
        get_transaction_endpoint, list_transactions_endpoint, recent_transactions_endpoint,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn get_test_server(connection: Connection) -> TestServer {
        let app = Router::new()
            .route(endpoints::TRANSACTIONS_API, get(list_transactions_endpoint))
            .route(
                endpoints::RECENT_TRANSACTIONS,
                get(recent_transactions_endpoint),
            )
            .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
            .with_state(TransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
                pagination_config: PaginationConfig::default(),
            });

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn list_returns_page_and_totals() {
        let connection = get_test_connection();
        for i in 0..15 {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    date!(2025 - 01 - 01) + Duration::days(i),
                    "Misc",
                ),
                &connection,
            )
            .unwrap();
        }
        let server = get_test_server(connection);

        let response = server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_param("page", 2)
            .await;

        response.assert_status_ok();
        let page: TransactionPage = response.json();
        assert_eq!(page.total, 15);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.limit, 10);
        assert_eq!(page.transactions.len(), 5);
    }

    #[tokio::test]
    async fn list_clamps_limit() {
        let server = get_test_server(get_test_connection());

        let response = server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_param("limit", 500)
            .await;

        response.assert_status_ok();
        let page: TransactionPage = response.json();
        assert_eq!(page.limit, 100);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn list_for_month_materializes_rules() {
        let connection = get_test_connection();
        create_recurring_rule(
            &NewRecurringRule {
                start_date: Some(date!(2025 - 01 - 01)),
                day_of_month: Some(10),
                ..NewRecurringRule::new("Gym", TransactionType::Expense, "Health", 30.0)
            },
            &connection,
        )
        .unwrap();
        let server = get_test_server(connection);

        let response = server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_param("year", 2025)
            .add_query_param("month", 6)
            .await;

        response.assert_status_ok();
        let page: TransactionPage = response.json();
        assert_eq!(page.total, 1);
        assert_eq!(page.transactions[0].date, date!(2025 - 06 - 10));
        assert_eq!(page.transactions[0].description, "Gym");
    }

    #[tokio::test]
    async fn list_with_invalid_month_is_bad_request() {
        let server = get_test_server(get_test_connection());

        server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_param("year", 2025)
            .add_query_param("month", 0)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn get_missing_transaction_is_not_found() {
        let server = get_test_server(get_test_connection());

        server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION, 42))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let connection = get_test_connection();
        for i in 0..12 {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    date!(2025 - 01 - 01) + Duration::days(i),
                    "Misc",
                ),
                &connection,
            )
            .unwrap();
        }
        let server = get_test_server(connection);

        let response = server.get(endpoints::RECENT_TRANSACTIONS).await;

        response.assert_status_ok();
        let transactions: Vec<Transaction> = response.json();
        assert_eq!(transactions.len(), 10);
        assert_eq!(transactions[0].date, date!(2025 - 01 - 12));
        assert_eq!(transactions[9].date, date!(2025 - 01 - 03));
    }

    #[tokio::test]
    async fn recent_caps_limit() {
        let connection = get_test_connection();
        for i in 0..60 {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    date!(2025 - 01 - 01) + Duration::days(i),
                    "Misc",
                ),
                &connection,
            )
            .unwrap();
        }
        let server = get_test_server(connection);

        let capped: Vec<Transaction> = server
            .get(endpoints::RECENT_TRANSACTIONS)
            .add_query_param("limit", 500)
            .await
            .json();
        let small: Vec<Transaction> = server
            .get(endpoints::RECENT_TRANSACTIONS)
            .add_query_param("limit", 3)
            .await
            .json();

        assert_eq!(capped.len(), 50);
        assert_eq!(small.len(), 3);
    }
}

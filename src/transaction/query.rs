//! Database query helpers for listing transactions.

use rusqlite::{Connection, ToSql};
use serde::Deserialize;
use time::Date;

use crate::{Error, pagination::Page};

use super::core::{
    TRANSACTION_COLUMNS, Transaction, TransactionStatus, TransactionType, map_transaction_row,
};

/// The optional filters for listing transactions.
///
/// Every filter that is set must match. Date bounds are inclusive.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub year: Option<i32>,
    pub month: Option<u8>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub status: Option<TransactionStatus>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl TransactionFilter {
    /// Build the `WHERE` clause and its parameters for this filter.
    pub(crate) fn where_clause(&self) -> (String, Vec<&dyn ToSql>) {
        let mut conditions = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(year) = &self.year {
            params.push(year);
            conditions.push(format!("year = ?{}", params.len()));
        }
        if let Some(month) = &self.month {
            params.push(month);
            conditions.push(format!("month = ?{}", params.len()));
        }
        if let Some(transaction_type) = &self.transaction_type {
            params.push(transaction_type);
            conditions.push(format!("type = ?{}", params.len()));
        }
        if let Some(category) = &self.category {
            params.push(category);
            conditions.push(format!("category = ?{}", params.len()));
        }
        if let Some(status) = &self.status {
            params.push(status);
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(start_date) = &self.start_date {
            params.push(start_date);
            conditions.push(format!("date >= ?{}", params.len()));
        }
        if let Some(end_date) = &self.end_date {
            params.push(end_date);
            conditions.push(format!("date <= ?{}", params.len()));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Get one page of the transactions matching `filter`, newest first.
///
/// Transactions on the same date are ordered by ID to keep the order stable
/// after updates.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn query_transactions(
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    // SQLite integers are signed.
    let limit = i64::try_from(page.size).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    let (where_clause, mut params) = filter.where_clause();
    params.push(&limit);
    let limit_index = params.len();
    params.push(&offset);
    let offset_index = params.len();

    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {where_clause} \
         ORDER BY date DESC, id ASC LIMIT ?{limit_index} OFFSET ?{offset_index}"
    );

    connection
        .prepare(&query)?
        .query_map(params.as_slice(), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Count the transactions matching `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_filtered_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause();

    let count: i64 = connection.query_row(
        &format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}"),
        params.as_slice(),
        |row| row.get(0),
    )?;

    Ok(u64::try_from(count).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, macros::date};

    use crate::{
        db::initialize,
        pagination::Page,
        transaction::{Transaction, TransactionStatus, TransactionType, create_transaction},
    };

    use super::{TransactionFilter, count_filtered_transactions, query_transactions};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn first_page() -> Page {
        Page {
            number: 1,
            size: 100,
        }
    }

    #[test]
    fn orders_newest_first_then_by_id() {
        let conn = get_test_connection();
        let day = date!(2025 - 10 - 05);
        for i in 0..4 {
            let date = if i < 2 { day } else { day - Duration::days(1) };
            create_transaction(
                Transaction::build(TransactionType::Expense, date, "Misc").amount(Some(i as f64)),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got = query_transactions(&TransactionFilter::default(), first_page(), &conn)
            .expect("Could not query transactions");

        let ids: Vec<_> = got.iter().map(|transaction| transaction.id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
        assert_eq!(got[0].date, day);
        assert_eq!(got[3].date, day - Duration::days(1));
    }

    #[test]
    fn filters_by_month_type_and_status() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 05), "Rent"),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(TransactionType::Income, date!(2025 - 01 - 10), "Salary")
                .status(TransactionStatus::Paid),
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 02 - 05), "Rent"),
            &conn,
        )
        .unwrap();
        let filter = TransactionFilter {
            year: Some(2025),
            month: Some(1),
            transaction_type: Some(TransactionType::Expense),
            status: Some(TransactionStatus::Planned),
            ..Default::default()
        };

        let got = query_transactions(&filter, first_page(), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].category, "Rent");
        assert_eq!(got[0].month, 1);
        assert_eq!(count_filtered_transactions(&filter, &conn), Ok(1));
    }

    #[test]
    fn date_range_is_inclusive() {
        let conn = get_test_connection();
        for day in 1..=5 {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    date!(2025 - 01 - 01) + Duration::days(day - 1),
                    "Misc",
                ),
                &conn,
            )
            .unwrap();
        }
        let filter = TransactionFilter {
            start_date: Some(date!(2025 - 01 - 02)),
            end_date: Some(date!(2025 - 01 - 04)),
            ..Default::default()
        };

        assert_eq!(count_filtered_transactions(&filter, &conn), Ok(3));
    }

    #[test]
    fn pages_through_results() {
        let conn = get_test_connection();
        for i in 0..25 {
            create_transaction(
                Transaction::build(
                    TransactionType::Expense,
                    date!(2025 - 01 - 01) + Duration::days(i),
                    "Misc",
                ),
                &conn,
            )
            .unwrap();
        }
        let filter = TransactionFilter::default();

        let got = query_transactions(
            &filter,
            Page {
                number: 3,
                size: 10,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 5);
        assert_eq!(got[0].date, date!(2025 - 01 - 05));
        assert_eq!(count_filtered_transactions(&filter, &conn), Ok(25));
    }

    #[test]
    fn page_far_past_the_end_is_empty() {
        let conn = get_test_connection();
        create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 01), "Misc"),
            &conn,
        )
        .unwrap();

        let got = query_transactions(
            &TransactionFilter::default(),
            Page {
                number: u64::MAX,
                size: 100,
            },
            &conn,
        )
        .unwrap();

        assert!(got.is_empty());
    }
}

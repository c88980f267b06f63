//! Defines the core data models and database queries for ledger entries.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::YearMonth,
    database_id::{FinancingId, RecurringId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money is coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money coming in, e.g. a salary.
    Income,
    /// Money going out, e.g. rent.
    Expense,
}

impl TransactionType {
    /// The text stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            other => Err(FromSqlError::Other(
                format!("{other} is not a valid transaction type").into(),
            )),
        }
    }
}

/// Where a ledger entry is in its lifecycle.
///
/// Entries start as `Planned`, become `Paid` either explicitly or through the
/// daily auto-pay sweep, and may be `Cancelled` by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Expected but not paid yet.
    Planned,
    /// Done. `amount` holds what was actually paid.
    Paid,
    /// Will not happen. Kept for the record.
    Cancelled,
}

impl TransactionStatus {
    /// The text stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "PLANNED" => Ok(Self::Planned),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(FromSqlError::Other(
                format!("{other} is not a valid transaction status").into(),
            )),
        }
    }
}

/// A ledger entry: an income or expense that is either planned for a month or
/// has already been paid.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction is due or happened.
    pub date: Date,
    /// The calendar year of `date`.
    pub year: i32,
    /// The calendar month of `date`, 1 to 12.
    pub month: u8,
    /// Income or expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The category, e.g. "Rent" or "Salary".
    pub category: String,
    /// A text description of what the transaction is for.
    pub description: String,
    /// The amount that was expected.
    pub planned_amount: Option<f64>,
    /// The amount that actually moved, usually unset until paid.
    pub amount: Option<f64>,
    /// The account the money moves through.
    pub account: Option<String>,
    /// Whether this is a fixed (recurring or installment) amount.
    pub is_fixed: bool,
    /// Where the transaction is in its lifecycle.
    pub status: TransactionStatus,
    /// The recurring rule that this entry was materialized from.
    pub recurring_id: Option<RecurringId>,
    /// The financing agreement that this entry is an installment of.
    pub financing_id: Option<FinancingId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        date: Date,
        category: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            date,
            category: category.to_owned(),
            description: String::new(),
            planned_amount: None,
            amount: None,
            account: None,
            is_fixed: false,
            status: TransactionStatus::Planned,
            recurring_id: None,
            financing_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The year and month of the transaction are always derived from `date`.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{Transaction, TransactionType};
///
/// let rent = Transaction::build(TransactionType::Expense, date!(2025 - 01 - 01), "Housing")
///     .description("Rent")
///     .planned_amount(Some(1200.0))
///     .is_fixed(true);
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// When the transaction is due or happened.
    pub date: Date,
    /// The category, must not be empty.
    pub category: String,
    /// A text description of what the transaction is for.
    pub description: String,
    /// The amount that is expected.
    pub planned_amount: Option<f64>,
    /// The amount that actually moved.
    pub amount: Option<f64>,
    /// The account the money moves through.
    pub account: Option<String>,
    /// Whether this is a fixed (recurring or installment) amount.
    pub is_fixed: bool,
    /// Where the transaction is in its lifecycle.
    pub status: TransactionStatus,
    /// Links the entry to a recurring rule.
    ///
    /// At most one entry per rule may exist in each month; the database
    /// enforces this with a unique index.
    pub recurring_id: Option<RecurringId>,
    /// Links the entry to a financing agreement.
    ///
    /// At most one entry per agreement may exist in each month.
    pub financing_id: Option<FinancingId>,
}

impl TransactionBuilder {
    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the planned amount.
    pub fn planned_amount(mut self, planned_amount: Option<f64>) -> Self {
        self.planned_amount = planned_amount;
        self
    }

    /// Set the actual amount.
    pub fn amount(mut self, amount: Option<f64>) -> Self {
        self.amount = amount;
        self
    }

    /// Set the account.
    pub fn account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }

    /// Mark the transaction as fixed or variable.
    pub fn is_fixed(mut self, is_fixed: bool) -> Self {
        self.is_fixed = is_fixed;
        self
    }

    /// Set the status, [TransactionStatus::Planned] by default.
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Link the transaction to a recurring rule.
    pub fn recurring_id(mut self, recurring_id: Option<RecurringId>) -> Self {
        self.recurring_id = recurring_id;
        self
    }

    /// Link the transaction to a financing agreement.
    pub fn financing_id(mut self, financing_id: Option<FinancingId>) -> Self {
        self.financing_id = financing_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the transaction table in the order [map_transaction_row] expects.
pub(crate) const TRANSACTION_COLUMNS: &str = "id, date, year, month, type, category, description, \
     planned_amount, amount, account, is_fixed, status, recurring_id, financing_id";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateOccurrence] if the linked obligation already has an entry in that month,
/// - [Error::NotFound] if the linked recurring rule or financing agreement does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let year_month = YearMonth::of(builder.date);

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (date, year, month, type, category, description, \
             planned_amount, amount, account, is_fixed, status, recurring_id, financing_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                builder.date,
                year_month.year(),
                year_month.month(),
                builder.transaction_type,
                builder.category,
                builder.description,
                builder.planned_amount,
                builder.amount,
                builder.account,
                builder.is_fixed,
                builder.status,
                builder.recurring_id,
                builder.financing_id,
            ],
            map_transaction_row,
        )
        .map_err(map_constraint_error)
}

/// Insert a ledger entry unless its obligation already has one in the same month.
///
/// Returns `true` if a row was inserted and `false` if a matching entry already
/// existed, in which case the existing row is left untouched. The check and the
/// insert happen in a single statement, so concurrent callers cannot create two
/// entries for the same obligation and month.
///
/// The natural key is `(recurring_id, year, month)` or `(financing_id, year,
/// month)`, so `builder` should link to a recurring rule or a financing
/// agreement. An unlinked entry has no natural key and is always inserted.
///
/// # Errors
/// Returns an [Error::SqlError] if the insert fails for any reason other than
/// the entry already existing.
pub fn insert_transaction_if_absent(
    builder: &TransactionBuilder,
    connection: &Connection,
) -> Result<bool, Error> {
    let year_month = YearMonth::of(builder.date);

    let rows_inserted = connection.execute(
        "INSERT INTO \"transaction\" (date, year, month, type, category, description, \
         planned_amount, amount, account, is_fixed, status, recurring_id, financing_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
         ON CONFLICT DO NOTHING",
        rusqlite::params![
            builder.date,
            year_month.year(),
            year_month.month(),
            builder.transaction_type,
            builder.category,
            builder.description,
            builder.planned_amount,
            builder.amount,
            builder.account,
            builder.is_fixed,
            builder.status,
            builder.recurring_id,
            builder.financing_id,
        ],
    )?;

    Ok(rows_inserted == 1)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Replace the fields of transaction `id` with those in `builder`.
///
/// The year and month are recomputed from the builder's date.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
/// - [Error::DuplicateOccurrence] if the entry is moved into a month where its
///   obligation already has an entry,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: &TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let year_month = YearMonth::of(builder.date);

    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET date = ?1, year = ?2, month = ?3, type = ?4, \
             category = ?5, description = ?6, planned_amount = ?7, amount = ?8, account = ?9, \
             is_fixed = ?10, status = ?11, recurring_id = ?12, financing_id = ?13 \
             WHERE id = ?14 \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                builder.date,
                year_month.year(),
                year_month.month(),
                builder.transaction_type,
                builder.category,
                builder.description,
                builder.planned_amount,
                builder.amount,
                builder.account,
                builder.is_fixed,
                builder.status,
                builder.recurring_id,
                builder.financing_id,
                id,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => map_constraint_error(error),
        })
}

/// Mark transaction `id` as paid.
///
/// The amount becomes `amount` if given, otherwise the amount already on the
/// entry, otherwise its planned amount.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn pay_transaction(
    id: TransactionId,
    amount: Option<f64>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET status = ?1, amount = COALESCE(?2, amount, planned_amount) \
             WHERE id = ?3 \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![TransactionStatus::Paid, amount, id],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// Mark transaction `id` as cancelled.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn cancel_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET status = ?1 WHERE id = ?2 RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![TransactionStatus::Cancelled, id],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
            error => error.into(),
        })
}

/// Delete transaction `id`.
///
/// Deleting an entry that was materialized from an obligation frees its
/// month, so the next materialization of that month recreates it.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id",
        &[(":id", &id)],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// Expects the recurring rule and financing tables to exist.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE')),
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                planned_amount REAL,
                amount REAL,
                account TEXT,
                is_fixed INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'PLANNED'
                    CHECK (status IN ('PLANNED', 'PAID', 'CANCELLED')),
                recurring_id INTEGER,
                financing_id INTEGER,
                FOREIGN KEY(recurring_id) REFERENCES recurring_rule(id)
                    ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(financing_id) REFERENCES financing(id)
                    ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // One entry per obligation per month. These indexes are what makes
    // `insert_transaction_if_absent` an atomic insert-if-absent.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_recurring_month \
         ON \"transaction\"(recurring_id, year, month) WHERE recurring_id IS NOT NULL",
        (),
    )?;
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_financing_month \
         ON \"transaction\"(financing_id, year, month) WHERE financing_id IS NOT NULL",
        (),
    )?;

    // Month-scoped listing and reports.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_year_month_type \
         ON \"transaction\"(year, month, type)",
        (),
    )?;

    // The auto-pay sweep and date range filters.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_status_date ON \"transaction\"(status, date)",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in [TRANSACTION_COLUMNS] order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        transaction_type: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        planned_amount: row.get(7)?,
        amount: row.get(8)?,
        account: row.get(9)?,
        is_fixed: row.get(10)?,
        status: row.get(11)?,
        recurring_id: row.get(12)?,
        financing_id: row.get(13)?,
    })
}

/// Map the constraint failures a write to the transaction table can cause.
pub(crate) fn map_constraint_error(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateOccurrence,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::NotFound,
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        recurring::{NewRecurringRule, create_recurring_rule},
        transaction::{
            Transaction, TransactionBuilder, TransactionStatus, TransactionType, cancel_transaction,
            count_transactions, create_transaction, delete_transaction, get_transaction,
            insert_transaction_if_absent, pay_transaction, update_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 10 - 05), "Groceries")
                .description("Supermarket")
                .amount(Some(12.3)),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, Some(12.3));
                assert_eq!(transaction.year, 2025);
                assert_eq!(transaction.month, 10);
                assert_eq!(transaction.status, TransactionStatus::Planned);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn get_returns_created_transaction() {
        let conn = get_test_connection();
        let want = create_transaction(
            Transaction::build(TransactionType::Income, date!(2025 - 01 - 15), "Salary")
                .planned_amount(Some(1000.0))
                .account(Some("Checking".to_owned()))
                .is_fixed(true),
            &conn,
        )
        .expect("Could not create transaction");

        let got = get_transaction(want.id, &conn);

        assert_eq!(got, Ok(want));
    }

    #[test]
    fn get_missing_transaction_returns_not_found() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(42, &conn), Err(Error::NotFound));
    }

    #[test]
    fn create_fails_on_missing_recurring_rule() {
        let conn = get_test_connection();

        let result = create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 15), "Rent")
                .recurring_id(Some(42)),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn insert_if_absent_only_inserts_once_per_month() {
        let conn = get_test_connection();
        let rule = create_recurring_rule(
            &NewRecurringRule::new("Rent", TransactionType::Expense, "Housing", 1200.0),
            &conn,
        )
        .expect("Could not create rule");
        let builder = Transaction::build(TransactionType::Expense, date!(2025 - 01 - 01), "Housing")
            .description("Rent")
            .planned_amount(Some(1200.0))
            .recurring_id(Some(rule.id));

        let first = insert_transaction_if_absent(&builder, &conn);
        let second = insert_transaction_if_absent(&builder.clone().planned_amount(Some(1.0)), &conn);

        assert_eq!(first, Ok(true));
        assert_eq!(second, Ok(false));
        assert_eq!(count_transactions(&conn), Ok(1));
    }

    #[test]
    fn insert_if_absent_does_not_modify_existing_entry() {
        let conn = get_test_connection();
        let rule = create_recurring_rule(
            &NewRecurringRule::new("Rent", TransactionType::Expense, "Housing", 1200.0),
            &conn,
        )
        .expect("Could not create rule");
        let builder = Transaction::build(TransactionType::Expense, date!(2025 - 01 - 01), "Housing")
            .planned_amount(Some(1200.0))
            .recurring_id(Some(rule.id));
        insert_transaction_if_absent(&builder, &conn).expect("Could not insert");
        conn.execute(
            "UPDATE \"transaction\" SET status = 'PAID', amount = 1100.0",
            (),
        )
        .unwrap();

        insert_transaction_if_absent(&builder, &conn).expect("Could not insert");

        let got = get_transaction(1, &conn).expect("Could not get transaction");
        assert_eq!(got.status, TransactionStatus::Paid);
        assert_eq!(got.amount, Some(1100.0));
    }

    #[test]
    fn same_rule_in_different_months_are_separate_entries() {
        let conn = get_test_connection();
        let rule = create_recurring_rule(
            &NewRecurringRule::new("Rent", TransactionType::Expense, "Housing", 1200.0),
            &conn,
        )
        .expect("Could not create rule");

        for date in [date!(2025 - 01 - 01), date!(2025 - 02 - 01)] {
            let builder = Transaction::build(TransactionType::Expense, date, "Housing")
                .recurring_id(Some(rule.id));
            assert_eq!(insert_transaction_if_absent(&builder, &conn), Ok(true));
        }

        assert_eq!(count_transactions(&conn), Ok(2));
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let today = date!(2025 - 10 - 05);
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(
                Transaction::build(TransactionType::Expense, today, "Misc").amount(Some(i as f64)),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }

    #[test]
    fn update_recomputes_year_and_month() {
        let conn = get_test_connection();
        let created = create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 31), "Rent"),
            &conn,
        )
        .expect("Could not create transaction");

        let got = update_transaction(
            created.id,
            &Transaction::build(TransactionType::Expense, date!(2025 - 03 - 01), "Rent")
                .planned_amount(Some(900.0)),
            &conn,
        )
        .expect("Could not update transaction");

        assert_eq!(got.year, 2025);
        assert_eq!(got.month, 3);
        assert_eq!(got.planned_amount, Some(900.0));
    }

    #[test]
    fn update_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = update_transaction(
            42,
            &Transaction::build(TransactionType::Expense, date!(2025 - 03 - 01), "Rent"),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn update_into_occupied_month_is_duplicate() {
        let conn = get_test_connection();
        let rule = create_recurring_rule(
            &NewRecurringRule::new("Rent", TransactionType::Expense, "Housing", 1200.0),
            &conn,
        )
        .expect("Could not create rule");
        let january = Transaction::build(TransactionType::Expense, date!(2025 - 01 - 01), "Housing")
            .recurring_id(Some(rule.id));
        let february = january.clone();
        let february = TransactionBuilder {
            date: date!(2025 - 02 - 01),
            ..february
        };
        let first = create_transaction(january, &conn).expect("Could not create transaction");
        create_transaction(february.clone(), &conn).expect("Could not create transaction");

        let result = update_transaction(first.id, &february, &conn);

        assert_eq!(result, Err(Error::DuplicateOccurrence));
    }

    #[test]
    fn pay_falls_back_to_planned_amount() {
        let conn = get_test_connection();
        let created = create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 05), "Power")
                .planned_amount(Some(80.0)),
            &conn,
        )
        .expect("Could not create transaction");

        let got = pay_transaction(created.id, None, &conn).expect("Could not pay transaction");

        assert_eq!(got.status, TransactionStatus::Paid);
        assert_eq!(got.amount, Some(80.0));
    }

    #[test]
    fn pay_uses_given_amount() {
        let conn = get_test_connection();
        let created = create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 05), "Power")
                .planned_amount(Some(80.0))
                .amount(Some(75.0)),
            &conn,
        )
        .expect("Could not create transaction");

        let got = pay_transaction(created.id, Some(92.5), &conn).expect("Could not pay");

        assert_eq!(got.amount, Some(92.5));
    }

    #[test]
    fn pay_keeps_existing_amount() {
        let conn = get_test_connection();
        let created = create_transaction(
            Transaction::build(TransactionType::Expense, date!(2025 - 01 - 05), "Power")
                .planned_amount(Some(80.0))
                .amount(Some(75.0)),
            &conn,
        )
        .expect("Could not create transaction");

        let got = pay_transaction(created.id, None, &conn).expect("Could not pay");

        assert_eq!(got.amount, Some(75.0));
    }

    #[test]
    fn cancel_sets_status() {
        let conn = get_test_connection();
        let created = create_transaction(
            Transaction::build(TransactionType::Income, date!(2025 - 01 - 05), "Salary"),
            &conn,
        )
        .expect("Could not create transaction");

        let got = cancel_transaction(created.id, &conn).expect("Could not cancel");

        assert_eq!(got.status, TransactionStatus::Cancelled);
        assert_eq!(cancel_transaction(99, &conn), Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let created = create_transaction(
            Transaction::build(TransactionType::Income, date!(2025 - 01 - 05), "Salary"),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(delete_transaction(created.id, &conn), Ok(()));
        assert_eq!(get_transaction(created.id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_transaction(created.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }
}

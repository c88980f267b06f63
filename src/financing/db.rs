use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::FinancingId,
    financing::models::{Financing, FinancingStats, NewFinancing},
};

const FINANCING_COLUMNS: &str = "id, name, kind, original_amount, outstanding_balance, \
     installment_amount, total_installments, paid_installments, interest_rate, start_date, \
     end_date, account, category, is_active";

/// Create a financing agreement in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_financing(
    financing: &NewFinancing,
    connection: &Connection,
) -> Result<Financing, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO financing (name, kind, original_amount, outstanding_balance, \
             installment_amount, total_installments, paid_installments, interest_rate, \
             start_date, end_date, account, category, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             RETURNING {FINANCING_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                financing.name,
                financing.kind,
                financing.original_amount,
                financing.outstanding_balance,
                financing.installment_amount,
                financing.total_installments,
                financing.paid_installments,
                financing.interest_rate,
                financing.start_date,
                financing.end_date,
                financing.account,
                financing.category,
                financing.is_active,
            ],
            map_financing_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a financing agreement by `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a financing agreement,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_financing(id: FinancingId, connection: &Connection) -> Result<Financing, Error> {
    connection
        .prepare(&format!(
            "SELECT {FINANCING_COLUMNS} FROM financing WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_financing_row)
        .map_err(|error| error.into())
}

/// Retrieve all financing agreements, most recently created first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_financings(connection: &Connection) -> Result<Vec<Financing>, Error> {
    connection
        .prepare(&format!(
            "SELECT {FINANCING_COLUMNS} FROM financing ORDER BY id DESC"
        ))?
        .query_map([], map_financing_row)?
        .map(|maybe_financing| maybe_financing.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the agreements that the month materializer should consider.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_active_financings(connection: &Connection) -> Result<Vec<Financing>, Error> {
    connection
        .prepare(&format!(
            "SELECT {FINANCING_COLUMNS} FROM financing WHERE is_active = 1 ORDER BY id ASC"
        ))?
        .query_map([], map_financing_row)?
        .map(|maybe_financing| maybe_financing.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of the agreement `id` with `financing`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingFinancing] if the agreement does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_financing(
    id: FinancingId,
    financing: &NewFinancing,
    connection: &Connection,
) -> Result<Financing, Error> {
    connection
        .prepare(&format!(
            "UPDATE financing SET name = ?1, kind = ?2, original_amount = ?3, \
             outstanding_balance = ?4, installment_amount = ?5, total_installments = ?6, \
             paid_installments = ?7, interest_rate = ?8, start_date = ?9, end_date = ?10, \
             account = ?11, category = ?12, is_active = ?13 \
             WHERE id = ?14 RETURNING {FINANCING_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                financing.name,
                financing.kind,
                financing.original_amount,
                financing.outstanding_balance,
                financing.installment_amount,
                financing.total_installments,
                financing.paid_installments,
                financing.interest_rate,
                financing.start_date,
                financing.end_date,
                financing.account,
                financing.category,
                financing.is_active,
                id,
            ],
            map_financing_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingFinancing,
            error => error.into(),
        })
}

/// Record a payment against the agreement `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingFinancing] if the agreement does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_financing_balance(
    id: FinancingId,
    paid_installments: u32,
    outstanding_balance: f64,
    is_active: bool,
    connection: &Connection,
) -> Result<Financing, Error> {
    connection
        .prepare(&format!(
            "UPDATE financing SET paid_installments = ?1, outstanding_balance = ?2, \
             is_active = ?3 WHERE id = ?4 RETURNING {FINANCING_COLUMNS}"
        ))?
        .query_row(
            (paid_installments, outstanding_balance, is_active, id),
            map_financing_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingFinancing,
            error => error.into(),
        })
}

/// Delete a financing agreement from the database.
///
/// Installments already in the ledger are kept and lose their link to it.
///
/// # Errors
/// This function will return an error if there is an SQL error or if the
/// agreement doesn't exist.
pub fn delete_financing(id: FinancingId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM financing WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingFinancing);
    }

    Ok(())
}

/// Compute totals across all financing agreements.
///
/// All totals are zero when there are no agreements.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_financing_stats(connection: &Connection) -> Result<FinancingStats, Error> {
    connection
        .query_row(
            "SELECT COUNT(id),
                COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(original_amount), 0.0),
                COALESCE(SUM(outstanding_balance), 0.0),
                COALESCE(SUM(CASE WHEN is_active = 1 THEN installment_amount ELSE 0.0 END), 0.0),
                COALESCE(AVG(interest_rate), 0.0)
            FROM financing",
            [],
            |row| {
                Ok(FinancingStats {
                    total_financings: row.get(0)?,
                    active_financings: row.get(1)?,
                    total_original_amount: row.get(2)?,
                    total_outstanding_balance: row.get(3)?,
                    total_monthly_payments: row.get(4)?,
                    average_interest_rate: row.get(5)?,
                })
            },
        )
        .map_err(|error| error.into())
}

/// Create the financing table and its index if they do not exist.
pub fn create_financing_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS financing (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'FINANCING'
                    CHECK (kind IN ('LOAN', 'FINANCING', 'CREDIT_CARD')),
                original_amount REAL NOT NULL,
                outstanding_balance REAL NOT NULL CHECK (outstanding_balance >= 0),
                installment_amount REAL NOT NULL,
                total_installments INTEGER NOT NULL CHECK (total_installments >= 1),
                paid_installments INTEGER NOT NULL DEFAULT 0 CHECK (paid_installments >= 0),
                interest_rate REAL NOT NULL DEFAULT 0
                    CHECK (interest_rate BETWEEN 0 AND 100),
                start_date TEXT NOT NULL,
                end_date TEXT,
                account TEXT,
                category TEXT NOT NULL DEFAULT 'Financing',
                is_active INTEGER NOT NULL DEFAULT 1
            )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_financing_is_active ON financing(is_active)",
        (),
    )?;

    Ok(())
}

fn map_financing_row(row: &Row) -> Result<Financing, rusqlite::Error> {
    Ok(Financing {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        original_amount: row.get(3)?,
        outstanding_balance: row.get(4)?,
        installment_amount: row.get(5)?,
        total_installments: row.get(6)?,
        paid_installments: row.get(7)?,
        interest_rate: row.get(8)?,
        start_date: row.get(9)?,
        end_date: row.get(10)?,
        account: row.get(11)?,
        category: row.get(12)?,
        is_active: row.get(13)?,
    })
}

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::RecurringId,
    recurring::models::{NewRecurringRule, RecurringRule},
};

const RECURRING_COLUMNS: &str = "id, name, type, category, amount, day_of_month, start_date, \
     end_date, installments, account, is_active";

/// Create a recurring rule in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_recurring_rule(
    rule: &NewRecurringRule,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO recurring_rule (name, type, category, amount, day_of_month, start_date, \
             end_date, installments, account, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                rule.name,
                rule.transaction_type,
                rule.category,
                rule.amount,
                rule.day_of_month,
                rule.start_date,
                rule.end_date,
                rule.installments,
                rule.account,
                rule.is_active,
            ],
            map_recurring_rule_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a recurring rule in the database by `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring rule,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_recurring_rule(id: RecurringId, connection: &Connection) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_rule WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_recurring_rule_row)
        .map_err(|error| error.into())
}

/// Retrieve all recurring rules, most recently created first.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_recurring_rules(connection: &Connection) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_rule ORDER BY id DESC"
        ))?
        .query_map([], map_recurring_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the rules that the month materializer should consider.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_active_recurring_rules(connection: &Connection) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_rule WHERE is_active = 1 ORDER BY id ASC"
        ))?
        .query_map([], map_recurring_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of the rule `id` with `rule`.
///
/// Existing ledger entries are not touched.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecurring] if the rule does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_recurring_rule(
    id: RecurringId,
    rule: &NewRecurringRule,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "UPDATE recurring_rule SET name = ?1, type = ?2, category = ?3, amount = ?4, \
             day_of_month = ?5, start_date = ?6, end_date = ?7, installments = ?8, account = ?9, \
             is_active = ?10 WHERE id = ?11 RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                rule.name,
                rule.transaction_type,
                rule.category,
                rule.amount,
                rule.day_of_month,
                rule.start_date,
                rule.end_date,
                rule.installments,
                rule.account,
                rule.is_active,
                id,
            ],
            map_recurring_rule_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRecurring,
            error => error.into(),
        })
}

/// Activate or deactivate the rule `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecurring] if the rule does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_recurring_rule_active(
    id: RecurringId,
    is_active: bool,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    connection
        .prepare(&format!(
            "UPDATE recurring_rule SET is_active = ?1 WHERE id = ?2 RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row((is_active, id), map_recurring_rule_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingRecurring,
            error => error.into(),
        })
}

/// Delete a recurring rule from the database.
///
/// Ledger entries created from the rule are kept and lose their link to it.
///
/// # Errors
/// This function will return an error if there is an SQL error or if the rule doesn't exist.
pub fn delete_recurring_rule(id: RecurringId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM recurring_rule WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurring);
    }

    Ok(())
}

/// Create the recurring rule table and its index if they do not exist.
pub fn create_recurring_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_rule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE')),
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                day_of_month INTEGER CHECK (day_of_month BETWEEN 1 AND 31),
                start_date TEXT,
                end_date TEXT,
                installments INTEGER CHECK (installments >= 1),
                account TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            )",
        (),
    )?;

    // The materializer only reads active rules
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_rule_is_active ON recurring_rule(is_active)",
        (),
    )?;

    Ok(())
}

fn map_recurring_rule_row(row: &Row) -> Result<RecurringRule, rusqlite::Error> {
    Ok(RecurringRule {
        id: row.get(0)?,
        name: row.get(1)?,
        transaction_type: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        day_of_month: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        installments: row.get(8)?,
        account: row.get(9)?,
        is_active: row.get(10)?,
    })
}

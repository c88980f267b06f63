//! Planned versus actual totals for one month of the ledger.
//!
//! The report only reads what is already in the ledger. Obligations that have
//! not been materialized for the month are missing from it, so callers should
//! run [crate::materialize::ensure_month] first.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, calendar::YearMonth, transaction::TransactionType};

/// The category that entries with an empty category are reported under.
pub(super) const UNCATEGORIZED_LABEL: &str = "Other";

/// The fields of a ledger entry that the report needs.
///
/// Missing amounts are read as zero and an empty category as
/// [UNCATEGORIZED_LABEL].
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ReportEntry {
    pub transaction_type: TransactionType,
    pub category: String,
    pub planned_amount: f64,
    pub amount: f64,
    pub is_fixed: bool,
}

/// Planned and actual totals for a group of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedActual {
    /// The sum of the planned amounts.
    pub planned: f64,
    /// The sum of the actual amounts.
    pub actual: f64,
}

impl PlannedActual {
    fn add(&mut self, entry: &ReportEntry) {
        self.planned += entry.planned_amount;
        self.actual += entry.amount;
    }
}

/// Totals for one category.
///
/// The type is taken from the first entry seen in the category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    /// The sum of the planned amounts.
    pub planned: f64,
    /// The sum of the actual amounts.
    pub actual: f64,
    /// Whether the category is income or expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

/// Totals split by whether the entries are fixed obligations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedVariable {
    /// Recurring bills and financing installments.
    pub fixed: PlannedActual,
    /// Everything else.
    pub variable: PlannedActual,
}

/// Planned versus actual totals for one month of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// The year of the reported month.
    pub year: i32,
    /// The reported month, 1 to 12.
    pub month: u8,
    /// Planned income.
    pub income_planned: f64,
    /// Income actually received.
    pub income_actual: f64,
    /// Planned expenses.
    pub expense_planned: f64,
    /// Expenses actually paid.
    pub expense_actual: f64,
    /// Planned income minus planned expenses.
    pub net_planned: f64,
    /// Actual income minus actual expenses.
    pub net_actual: f64,
    /// Actual expenses as a percentage of actual income, 0 without income.
    pub spend_pct: f64,
    /// Totals per category, keyed by category name.
    pub by_category: BTreeMap<String, CategoryTotals>,
    /// Totals for fixed and variable entries.
    pub by_type: FixedVariable,
    /// The number of entries in the month, whatever their status.
    pub count: usize,
}

/// Build the report for `year_month` from its ledger entries.
pub(super) fn aggregate_month(year_month: YearMonth, entries: &[ReportEntry]) -> MonthlyReport {
    let mut income = PlannedActual::default();
    let mut expense = PlannedActual::default();
    let mut by_category: BTreeMap<String, CategoryTotals> = BTreeMap::new();
    let mut by_type = FixedVariable::default();

    for entry in entries {
        match entry.transaction_type {
            TransactionType::Income => income.add(entry),
            TransactionType::Expense => expense.add(entry),
        }

        let category = by_category
            .entry(entry.category.clone())
            .or_insert(CategoryTotals {
                planned: 0.0,
                actual: 0.0,
                transaction_type: entry.transaction_type,
            });
        category.planned += entry.planned_amount;
        category.actual += entry.amount;

        if entry.is_fixed {
            by_type.fixed.add(entry);
        } else {
            by_type.variable.add(entry);
        }
    }

    let spend_pct = if income.actual == 0.0 {
        0.0
    } else {
        expense.actual / income.actual * 100.0
    };

    MonthlyReport {
        year: year_month.year(),
        month: year_month.month(),
        income_planned: income.planned,
        income_actual: income.actual,
        expense_planned: expense.planned,
        expense_actual: expense.actual,
        net_planned: income.planned - expense.planned,
        net_actual: income.actual - expense.actual,
        spend_pct,
        by_category,
        by_type,
        count: entries.len(),
    }
}

/// Compute the report for `year_month` from the ledger.
///
/// # Errors
/// Returns [Error::SqlError] if the entries cannot be read.
pub fn monthly_report(year_month: YearMonth, connection: &Connection) -> Result<MonthlyReport, Error> {
    let entries = get_report_entries(year_month, connection)?;

    Ok(aggregate_month(year_month, &entries))
}

fn get_report_entries(
    year_month: YearMonth,
    connection: &Connection,
) -> Result<Vec<ReportEntry>, Error> {
    let query = format!(
        "SELECT
            type,
            COALESCE(NULLIF(TRIM(category), ''), '{UNCATEGORIZED_LABEL}'),
            COALESCE(planned_amount, 0.0),
            COALESCE(amount, 0.0),
            is_fixed
        FROM \"transaction\"
        WHERE year = ?1 AND month = ?2
        ORDER BY date, id"
    );

    connection
        .prepare(&query)?
        .query_map((year_month.year(), year_month.month()), |row| {
            Ok(ReportEntry {
                transaction_type: row.get(0)?,
                category: row.get(1)?,
                planned_amount: row.get(2)?,
                amount: row.get(3)?,
                is_fixed: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<ReportEntry>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

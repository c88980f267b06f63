//! Totals for the dashboard, the per-category report and the transaction summary.
//!
//! Each entry counts with its actual amount, or its planned amount while it has
//! no actual amount yet.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    calendar::YearMonth,
    pagination::Page,
    report::{monthly::UNCATEGORIZED_LABEL, period::DateRange},
    transaction::{Transaction, TransactionFilter, TransactionType, query_transactions},
};

/// The number of months in the dashboard's income and expense chart.
pub(super) const CHART_MONTHS: u32 = 6;

/// The number of transactions listed on the dashboard.
const DASHBOARD_RECENT_COUNT: u64 = 10;

/// The fields of a ledger entry that the summaries need.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct LedgerAmount {
    pub transaction_type: TransactionType,
    pub category: String,
    pub year: i32,
    pub month: u8,
    pub amount: f64,
}

/// Income and expense totals over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    /// Net balance as a percentage of income, 0 without income.
    pub savings_rate: f64,
}

/// Income and expenses for one month of the dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    /// The month formatted as "YYYY-MM".
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

/// The total of one category on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAmount {
    pub category: String,
    pub amount: f64,
}

/// Everything the dashboard shows for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: DashboardSummary,
    /// The last six months up to and including the current one, oldest first.
    pub monthly_data: Vec<MonthTotals>,
    /// Category totals, largest first.
    pub category_data: Vec<CategoryAmount>,
    /// The newest transactions in the period.
    pub recent_transactions: Vec<Transaction>,
}

/// Totals for one category and type over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub category: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub total_amount: f64,
    pub transaction_count: usize,
    pub average_amount: f64,
}

/// Income and expense totals and counts over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total_income: f64,
    pub total_expenses: f64,
    pub income_count: usize,
    pub expense_count: usize,
}

pub(super) fn summarize(entries: &[LedgerAmount]) -> DashboardSummary {
    let stats = count_by_type(entries);
    let net_balance = stats.total_income - stats.total_expenses;
    let savings_rate = if stats.total_income > 0.0 {
        net_balance * 100.0 / stats.total_income
    } else {
        0.0
    };

    DashboardSummary {
        total_income: stats.total_income,
        total_expenses: stats.total_expenses,
        net_balance,
        savings_rate,
    }
}

pub(super) fn count_by_type(entries: &[LedgerAmount]) -> TransactionStats {
    let mut stats = TransactionStats::default();

    for entry in entries {
        match entry.transaction_type {
            TransactionType::Income => {
                stats.total_income += entry.amount;
                stats.income_count += 1;
            }
            TransactionType::Expense => {
                stats.total_expenses += entry.amount;
                stats.expense_count += 1;
            }
        }
    }

    stats
}

/// Income and expenses for each of `months`, in the given order.
///
/// Months without entries are reported as zero.
pub(super) fn totals_by_month(months: &[YearMonth], entries: &[LedgerAmount]) -> Vec<MonthTotals> {
    months
        .iter()
        .map(|year_month| {
            let mut income = 0.0;
            let mut expenses = 0.0;

            let in_month = |entry: &&LedgerAmount| {
                entry.year == year_month.year() && entry.month == year_month.month()
            };

            for entry in entries.iter().filter(in_month) {
                match entry.transaction_type {
                    TransactionType::Income => income += entry.amount,
                    TransactionType::Expense => expenses += entry.amount,
                }
            }

            MonthTotals {
                month: year_month.to_string(),
                income,
                expenses,
            }
        })
        .collect()
}

/// Sum entries by category regardless of type, largest magnitude first.
pub(super) fn totals_by_category(entries: &[LedgerAmount]) -> Vec<CategoryAmount> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();

    for entry in entries {
        *totals.entry(entry.category.as_str()).or_insert(0.0) += entry.amount;
    }

    let mut categories: Vec<_> = totals
        .into_iter()
        .map(|(category, amount)| CategoryAmount {
            category: category.to_owned(),
            amount,
        })
        .collect();
    categories.sort_by(|a, b| b.amount.abs().total_cmp(&a.amount.abs()));

    categories
}

/// Group entries by category and type, largest total first.
pub(super) fn group_by_category(entries: &[LedgerAmount]) -> Vec<CategoryReport> {
    let mut groups: BTreeMap<(&str, &str), CategoryReport> = BTreeMap::new();

    for entry in entries {
        let report = groups
            .entry((entry.category.as_str(), entry.transaction_type.as_str()))
            .or_insert_with(|| CategoryReport {
                category: entry.category.clone(),
                transaction_type: entry.transaction_type,
                total_amount: 0.0,
                transaction_count: 0,
                average_amount: 0.0,
            });
        report.total_amount += entry.amount;
        report.transaction_count += 1;
    }

    let mut reports: Vec<_> = groups
        .into_values()
        .map(|mut report| {
            report.average_amount = report.total_amount / report.transaction_count as f64;
            report
        })
        .collect();
    reports.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));

    reports
}

/// Build the dashboard for `range` when today is `today`.
///
/// The chart always covers the [CHART_MONTHS] months ending with the month of
/// `today`, whatever the range.
///
/// # Errors
/// Returns [Error::SqlError] if the ledger cannot be read, or
/// [Error::InvalidDate] if the chart months are outside the supported range.
pub fn dashboard(
    range: DateRange,
    today: Date,
    connection: &Connection,
) -> Result<Dashboard, Error> {
    let entries = get_ledger_amounts(&range.filter(), connection)?;

    let this_month = YearMonth::of(today);
    let chart_months = chart_months(this_month);
    let chart_filter = TransactionFilter {
        start_date: Some(chart_months[0].first_day()?),
        end_date: Some(this_month.last_day()?),
        ..Default::default()
    };
    let chart_entries = get_ledger_amounts(&chart_filter, connection)?;

    let recent_transactions = query_transactions(
        &range.filter(),
        Page {
            number: 1,
            size: DASHBOARD_RECENT_COUNT,
        },
        connection,
    )?;

    Ok(Dashboard {
        summary: summarize(&entries),
        monthly_data: totals_by_month(&chart_months, &chart_entries),
        category_data: totals_by_category(&entries),
        recent_transactions,
    })
}

/// The months shown in the dashboard chart, oldest first.
pub(super) fn chart_months(this_month: YearMonth) -> Vec<YearMonth> {
    (0..CHART_MONTHS)
        .rev()
        .map(|offset| this_month.sub_months(offset))
        .collect()
}

/// Totals per category and type over `range`, optionally for one type only.
///
/// # Errors
/// Returns [Error::SqlError] if the ledger cannot be read.
pub fn category_report(
    range: DateRange,
    transaction_type: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<CategoryReport>, Error> {
    let filter = TransactionFilter {
        transaction_type,
        ..range.filter()
    };
    let entries = get_ledger_amounts(&filter, connection)?;

    Ok(group_by_category(&entries))
}

/// Income and expense totals and counts over `range`.
///
/// # Errors
/// Returns [Error::SqlError] if the ledger cannot be read.
pub fn transaction_stats(
    range: DateRange,
    connection: &Connection,
) -> Result<TransactionStats, Error> {
    let entries = get_ledger_amounts(&range.filter(), connection)?;

    Ok(count_by_type(&entries))
}

fn get_ledger_amounts(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<LedgerAmount>, Error> {
    let (where_clause, params) = filter.where_clause();
    let query = format!(
        "SELECT
            type,
            COALESCE(NULLIF(TRIM(category), ''), '{UNCATEGORIZED_LABEL}'),
            year,
            month,
            COALESCE(amount, planned_amount, 0.0)
        FROM \"transaction\" {where_clause}
        ORDER BY date, id"
    );

    connection
        .prepare(&query)?
        .query_map(params.as_slice(), |row| {
            Ok(LedgerAmount {
                transaction_type: row.get(0)?,
                category: row.get(1)?,
                year: row.get(2)?,
                month: row.get(3)?,
                amount: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<LedgerAmount>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

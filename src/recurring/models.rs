use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error, calendar::YearMonth, database_id::RecurringId,
    nullable::deserialize_nullable, transaction::TransactionType,
};

/// An income or expense that repeats every month, e.g. rent or a salary.
///
/// Rules are read by the month materializer, which creates one ledger entry per
/// rule per month while the rule is in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    /// The ID of the rule.
    pub id: RecurringId,
    /// Used as the description of the materialized ledger entries.
    pub name: String,
    /// Whether the rule is an income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The category of the materialized entries.
    pub category: String,
    /// The planned amount of every occurrence.
    pub amount: f64,
    /// The preferred day of the month, 1 to 31.
    ///
    /// Falls back to the day of `start_date`, then to the 1st.
    pub day_of_month: Option<u8>,
    /// The first month the rule applies to.
    ///
    /// A rule without a start date applies to every month it is asked about.
    /// Rules with an installment count always have one.
    pub start_date: Option<Date>,
    /// The last month the rule applies to.
    pub end_date: Option<Date>,
    /// The maximum number of occurrences, counted from `start_date`.
    pub installments: Option<u32>,
    /// The account the money moves through.
    pub account: Option<String>,
    /// Inactive rules are neither seeded nor materialized.
    pub is_active: bool,
}

/// The data needed to create or replace a recurring rule.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringRule {
    /// Used as the description of the materialized ledger entries.
    pub name: String,
    /// Whether the rule is an income or an expense.
    pub transaction_type: TransactionType,
    /// The category of the materialized entries, must not be empty.
    pub category: String,
    /// The planned amount of every occurrence.
    pub amount: f64,
    /// The preferred day of the month, 1 to 31.
    pub day_of_month: Option<u8>,
    /// The first month the rule applies to.
    pub start_date: Option<Date>,
    /// The last month the rule applies to.
    pub end_date: Option<Date>,
    /// The maximum number of occurrences, at least 1.
    pub installments: Option<u32>,
    /// The account the money moves through.
    pub account: Option<String>,
    /// Whether the rule is seeded and materialized.
    pub is_active: bool,
}

impl NewRecurringRule {
    /// An active, open-ended rule with no preferred day.
    pub fn new(name: &str, transaction_type: TransactionType, category: &str, amount: f64) -> Self {
        Self {
            name: name.to_owned(),
            transaction_type,
            category: category.to_owned(),
            amount,
            day_of_month: None,
            start_date: None,
            end_date: None,
            installments: None,
            account: None,
            is_active: true,
        }
    }

    /// Give a rule with an installment count but no start date a start date
    /// in the month of `today`.
    ///
    /// Installments are counted from the start month, so without one the
    /// count could never run out.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if the month of `today` is outside the
    /// supported date range.
    pub fn anchor_installments(&mut self, today: Date) -> Result<(), Error> {
        if self.installments.is_some() && self.start_date.is_none() {
            self.start_date = Some(YearMonth::of(today).first_day()?);
        }

        Ok(())
    }

    /// Check the invariants of a recurring rule.
    ///
    /// # Errors
    /// Returns an [Error::InvalidInput] if the name or category is empty, the
    /// day of month is not in 1..=31, the amount is not finite or the
    /// installment count is zero, and [Error::InvalidDateRange] if the end date
    /// comes before the start date.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("name cannot be empty".to_owned()));
        }

        if self.category.trim().is_empty() {
            return Err(Error::InvalidInput("category cannot be empty".to_owned()));
        }

        if !self.amount.is_finite() {
            return Err(Error::InvalidInput("amount must be a number".to_owned()));
        }

        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(Error::InvalidInput(format!(
                    "day of month must be between 1 and 31, got {day}"
                )));
            }
        }

        if self.installments == Some(0) {
            return Err(Error::InvalidInput(
                "installments must be at least 1".to_owned(),
            ));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Error::InvalidDateRange { start, end });
            }
        }

        Ok(())
    }
}

impl From<RecurringRule> for NewRecurringRule {
    fn from(rule: RecurringRule) -> Self {
        Self {
            name: rule.name,
            transaction_type: rule.transaction_type,
            category: rule.category,
            amount: rule.amount,
            day_of_month: rule.day_of_month,
            start_date: rule.start_date,
            end_date: rule.end_date,
            installments: rule.installments,
            account: rule.account,
            is_active: rule.is_active,
        }
    }
}

/// Unified state for all recurring rule operations.
#[derive(Debug, Clone)]
pub struct RecurringState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to find the current month when seeding rules without a start date.
    pub local_timezone: String,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Request body for creating a recurring rule.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringForm {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    /// Preferred over `name` when both are given.
    pub description: Option<String>,
    pub name: Option<String>,
    pub amount: f64,
    pub day_of_month: Option<u8>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub installments: Option<u32>,
    pub account: Option<String>,
    pub is_active: Option<bool>,
}

impl RecurringForm {
    /// Convert the form into a validated rule.
    ///
    /// Without a description or name, the rule is named after its type and
    /// category, e.g. "EXPENSE - Housing". A rule with installments but no
    /// start date starts in the month of `today`.
    ///
    /// # Errors
    /// Returns the errors of [NewRecurringRule::validate].
    pub fn into_new_rule(self, today: Date) -> Result<NewRecurringRule, Error> {
        let name = [self.description, self.name]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_owned())
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{} - {}",
                    self.transaction_type.as_str(),
                    self.category.trim()
                )
            });

        let mut rule = NewRecurringRule {
            name,
            transaction_type: self.transaction_type,
            category: self.category.trim().to_owned(),
            amount: self.amount,
            day_of_month: self.day_of_month,
            start_date: self.start_date,
            end_date: self.end_date,
            installments: self.installments,
            account: self.account,
            is_active: self.is_active.unwrap_or(true),
        };

        rule.anchor_installments(today)?;
        rule.validate()?;

        Ok(rule)
    }
}

/// Request body for a partial update of a recurring rule.
///
/// Absent fields are left unchanged. The nullable fields can be cleared by
/// sending `null`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPatch {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub day_of_month: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub start_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub end_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub installments: Option<Option<u32>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub account: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl RecurringPatch {
    /// Apply the patch on top of `rule` and validate the result.
    ///
    /// If the result has installments but no start date, it starts in the
    /// month of `today`.
    ///
    /// # Errors
    /// Returns the errors of [NewRecurringRule::validate].
    pub fn apply(self, rule: RecurringRule, today: Date) -> Result<NewRecurringRule, Error> {
        let mut patched = NewRecurringRule::from(rule);

        if let Some(name) = self.description.or(self.name) {
            patched.name = name.trim().to_owned();
        }
        if let Some(transaction_type) = self.transaction_type {
            patched.transaction_type = transaction_type;
        }
        if let Some(category) = self.category {
            patched.category = category.trim().to_owned();
        }
        if let Some(amount) = self.amount {
            patched.amount = amount;
        }
        if let Some(day_of_month) = self.day_of_month {
            patched.day_of_month = Some(day_of_month);
        }
        if let Some(start_date) = self.start_date {
            patched.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            patched.end_date = end_date;
        }
        if let Some(installments) = self.installments {
            patched.installments = installments;
        }
        if let Some(account) = self.account {
            patched.account = account;
        }
        if let Some(is_active) = self.is_active {
            patched.is_active = is_active;
        }

        patched.anchor_installments(today)?;
        patched.validate()?;

        Ok(patched)
    }
}

/// Request body for activating or deactivating a rule.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleForm {
    pub is_active: bool,
}

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::{
    Connection, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{AppState, Error, database_id::FinancingId, nullable::deserialize_nullable};

/// The category used for installments when an agreement does not name one.
pub const DEFAULT_FINANCING_CATEGORY: &str = "Financing";

/// What sort of debt a financing agreement is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancingKind {
    /// A personal or bank loan.
    Loan,
    /// Store or vendor financing, e.g. buying a laptop in installments.
    #[default]
    Financing,
    /// A purchase split into credit card installments.
    CreditCard,
}

impl FinancingKind {
    /// The text stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loan => "LOAN",
            Self::Financing => "FINANCING",
            Self::CreditCard => "CREDIT_CARD",
        }
    }
}

impl ToSql for FinancingKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for FinancingKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "LOAN" => Ok(Self::Loan),
            "FINANCING" => Ok(Self::Financing),
            "CREDIT_CARD" => Ok(Self::CreditCard),
            other => Err(FromSqlError::Other(
                format!("{other} is not a valid financing kind").into(),
            )),
        }
    }
}

/// An installment loan or financing agreement.
///
/// While active, the agreement is materialized as one expense per month for
/// `total_installments` months starting from the month of `start_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financing {
    /// The ID of the agreement.
    pub id: FinancingId,
    /// What was financed, e.g. "Car".
    pub name: String,
    /// What sort of debt this is.
    #[serde(rename = "type")]
    pub kind: FinancingKind,
    /// The amount that was borrowed.
    pub original_amount: f64,
    /// The amount that is still owed.
    pub outstanding_balance: f64,
    /// The amount of each monthly installment.
    pub installment_amount: f64,
    /// The number of monthly installments.
    pub total_installments: u32,
    /// The number of installments paid so far.
    pub paid_installments: u32,
    /// Annual interest rate as a percentage.
    pub interest_rate: f64,
    /// The due date of the first installment. Later installments fall on the
    /// same day of the month, clamped to the length of the month.
    pub start_date: Date,
    /// When the agreement is expected to be paid off.
    pub end_date: Option<Date>,
    /// The account the installments are paid from.
    pub account: Option<String>,
    /// The category of the materialized installments.
    pub category: String,
    /// Inactive agreements are skipped by the month materializer.
    pub is_active: bool,
}

/// The data needed to create or replace a financing agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFinancing {
    /// What was financed.
    pub name: String,
    /// What sort of debt this is.
    pub kind: FinancingKind,
    /// The amount that was borrowed.
    pub original_amount: f64,
    /// The amount that is still owed.
    pub outstanding_balance: f64,
    /// The amount of each monthly installment.
    pub installment_amount: f64,
    /// The number of monthly installments, at least 1.
    pub total_installments: u32,
    /// The number of installments paid so far.
    pub paid_installments: u32,
    /// Annual interest rate as a percentage.
    pub interest_rate: f64,
    /// The due date of the first installment.
    pub start_date: Date,
    /// When the agreement is expected to be paid off.
    pub end_date: Option<Date>,
    /// The account the installments are paid from.
    pub account: Option<String>,
    /// The category of the materialized installments.
    pub category: String,
    /// Whether installments are materialized.
    pub is_active: bool,
}

impl NewFinancing {
    /// An active, interest free agreement with nothing paid yet.
    pub fn new(
        name: &str,
        installment_amount: f64,
        total_installments: u32,
        start_date: Date,
    ) -> Self {
        let original_amount = installment_amount * f64::from(total_installments);

        Self {
            name: name.to_owned(),
            kind: FinancingKind::default(),
            original_amount,
            outstanding_balance: original_amount,
            installment_amount,
            total_installments,
            paid_installments: 0,
            interest_rate: 0.0,
            start_date,
            end_date: None,
            account: None,
            category: DEFAULT_FINANCING_CATEGORY.to_owned(),
            is_active: true,
        }
    }

    /// Check the invariants of a financing agreement.
    ///
    /// # Errors
    /// Returns an [Error::InvalidInput] describing the first invalid field, or
    /// [Error::InvalidDateRange] if the end date comes before the start date.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("name cannot be empty".to_owned()));
        }

        if !(self.original_amount.is_finite() && self.original_amount > 0.0) {
            return Err(Error::InvalidInput(
                "original amount must be positive".to_owned(),
            ));
        }

        if !(self.outstanding_balance.is_finite() && self.outstanding_balance >= 0.0) {
            return Err(Error::InvalidInput(
                "outstanding balance cannot be negative".to_owned(),
            ));
        }

        if !(self.installment_amount.is_finite() && self.installment_amount > 0.0) {
            return Err(Error::InvalidInput(
                "installment amount must be positive".to_owned(),
            ));
        }

        if self.total_installments == 0 {
            return Err(Error::InvalidInput(
                "total installments must be at least 1".to_owned(),
            ));
        }

        if !(0.0..=100.0).contains(&self.interest_rate) {
            return Err(Error::InvalidInput(
                "interest rate must be between 0 and 100".to_owned(),
            ));
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::InvalidDateRange {
                    start: self.start_date,
                    end,
                });
            }
        }

        Ok(())
    }
}

impl From<Financing> for NewFinancing {
    fn from(financing: Financing) -> Self {
        Self {
            name: financing.name,
            kind: financing.kind,
            original_amount: financing.original_amount,
            outstanding_balance: financing.outstanding_balance,
            installment_amount: financing.installment_amount,
            total_installments: financing.total_installments,
            paid_installments: financing.paid_installments,
            interest_rate: financing.interest_rate,
            start_date: financing.start_date,
            end_date: financing.end_date,
            account: financing.account,
            category: financing.category,
            is_active: financing.is_active,
        }
    }
}

/// Totals across all financing agreements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingStats {
    pub total_financings: u32,
    pub active_financings: u32,
    pub total_original_amount: f64,
    pub total_outstanding_balance: f64,
    /// The sum of the installment amounts of active agreements.
    pub total_monthly_payments: f64,
    pub average_interest_rate: f64,
}

/// The state needed for the financing endpoints.
#[derive(Debug, Clone)]
pub struct FinancingState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for FinancingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Request body for creating a financing agreement.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingForm {
    /// Preferred over `name` when both are given.
    pub description: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: FinancingKind,
    pub original_amount: f64,
    /// Defaults to the original amount.
    pub outstanding_balance: Option<f64>,
    pub installment_amount: f64,
    pub total_installments: u32,
    #[serde(default)]
    pub paid_installments: u32,
    #[serde(default)]
    pub interest_rate: f64,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub account: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl FinancingForm {
    /// Convert the form into a validated agreement.
    ///
    /// # Errors
    /// Returns the errors of [NewFinancing::validate].
    pub fn into_new_financing(self) -> Result<NewFinancing, Error> {
        let name = self
            .description
            .or(self.name)
            .map(|name| name.trim().to_owned())
            .unwrap_or_default();

        let category = self
            .category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| DEFAULT_FINANCING_CATEGORY.to_owned());

        let financing = NewFinancing {
            name,
            kind: self.kind,
            original_amount: self.original_amount,
            outstanding_balance: self.outstanding_balance.unwrap_or(self.original_amount),
            installment_amount: self.installment_amount,
            total_installments: self.total_installments,
            paid_installments: self.paid_installments,
            interest_rate: self.interest_rate,
            start_date: self.start_date,
            end_date: self.end_date,
            account: self.account,
            category,
            is_active: self.is_active.unwrap_or(true),
        };

        financing.validate()?;

        Ok(financing)
    }
}

/// Request body for a partial update of a financing agreement.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancingPatch {
    pub description: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<FinancingKind>,
    pub original_amount: Option<f64>,
    pub outstanding_balance: Option<f64>,
    pub installment_amount: Option<f64>,
    pub total_installments: Option<u32>,
    pub paid_installments: Option<u32>,
    pub interest_rate: Option<f64>,
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub end_date: Option<Option<Date>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub account: Option<Option<String>>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl FinancingPatch {
    /// Apply the patch on top of `financing` and validate the result.
    ///
    /// # Errors
    /// Returns the errors of [NewFinancing::validate].
    pub fn apply(self, financing: Financing) -> Result<NewFinancing, Error> {
        let mut patched = NewFinancing::from(financing);

        if let Some(name) = self.description.or(self.name) {
            patched.name = name.trim().to_owned();
        }
        if let Some(kind) = self.kind {
            patched.kind = kind;
        }
        if let Some(original_amount) = self.original_amount {
            patched.original_amount = original_amount;
        }
        if let Some(outstanding_balance) = self.outstanding_balance {
            patched.outstanding_balance = outstanding_balance;
        }
        if let Some(installment_amount) = self.installment_amount {
            patched.installment_amount = installment_amount;
        }
        if let Some(total_installments) = self.total_installments {
            patched.total_installments = total_installments;
        }
        if let Some(paid_installments) = self.paid_installments {
            patched.paid_installments = paid_installments;
        }
        if let Some(interest_rate) = self.interest_rate {
            patched.interest_rate = interest_rate;
        }
        if let Some(start_date) = self.start_date {
            patched.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            patched.end_date = end_date;
        }
        if let Some(account) = self.account {
            patched.account = account;
        }
        if let Some(category) = self.category {
            let category = category.trim();
            patched.category = if category.is_empty() {
                DEFAULT_FINANCING_CATEGORY.to_owned()
            } else {
                category.to_owned()
            };
        }
        if let Some(is_active) = self.is_active {
            patched.is_active = is_active;
        }

        patched.validate()?;

        Ok(patched)
    }
}

//! Installment schedules and payments for financing agreements.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::YearMonth,
    database_id::FinancingId,
    financing::{
        db::{get_financing, update_financing_balance},
        models::Financing,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Paid,
    /// Unpaid and due before today.
    Overdue,
    Pending,
}

/// One installment of a financing agreement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub financing_id: FinancingId,
    /// Counts from 1.
    pub installment_number: u32,
    pub amount: f64,
    pub due_date: Date,
    pub paid_date: Option<Date>,
    pub status: InstallmentStatus,
}

/// Request body for paying an installment.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub installment_number: u32,
    /// Defaults to the installment amount.
    pub amount: Option<f64>,
}

/// Request body for simulating or making an early payment.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyPaymentForm {
    pub amount: f64,
}

/// The estimated effect of paying `early_payment_amount` off the balance now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyPaymentSimulation {
    pub current_balance: f64,
    pub early_payment_amount: f64,
    pub interest_saved: f64,
    pub months_saved: u32,
    pub new_end_date: Date,
}

/// The due date of installment `installment_number`.
///
/// Installment 1 is due on the start date and each following installment one
/// month later, on the same day clamped to the length of the month.
///
/// # Errors
/// Returns [Error::InvalidDate] if the due date is outside the supported range.
pub fn installment_due_date(financing: &Financing, installment_number: u32) -> Result<Date, Error> {
    YearMonth::of(financing.start_date)
        .add_months(installment_number.saturating_sub(1))
        .clamped_date(financing.start_date.day())
}

/// List every installment of `financing` with its status as of `today`.
///
/// # Errors
/// Returns [Error::InvalidDate] if a due date is outside the supported range.
pub fn installment_schedule(financing: &Financing, today: Date) -> Result<Vec<Installment>, Error> {
    (1..=financing.total_installments)
        .map(|installment_number| {
            let due_date = installment_due_date(financing, installment_number)?;
            let is_paid = installment_number <= financing.paid_installments;

            let status = if is_paid {
                InstallmentStatus::Paid
            } else if due_date < today {
                InstallmentStatus::Overdue
            } else {
                InstallmentStatus::Pending
            };

            Ok(Installment {
                financing_id: financing.id,
                installment_number,
                amount: financing.installment_amount,
                due_date,
                paid_date: is_paid.then_some(due_date),
                status,
            })
        })
        .collect()
}

/// Pay installment `form.installment_number` of the agreement `id` on `today`.
///
/// Paying installment `n` marks every installment up to `n` as paid. The
/// outstanding balance is reduced by the payment amount and never goes below
/// zero. Once every installment is paid or the balance reaches zero, the
/// agreement is deactivated.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInput] if the installment number or amount is invalid,
/// - [Error::NotFound] if the agreement does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn pay_installment(
    id: FinancingId,
    form: &PaymentForm,
    today: Date,
    connection: &Connection,
) -> Result<Installment, Error> {
    let financing = get_financing(id, connection)?;

    if !(1..=financing.total_installments).contains(&form.installment_number) {
        return Err(Error::InvalidInput(format!(
            "installment number must be between 1 and {}, got {}",
            financing.total_installments, form.installment_number
        )));
    }

    let amount = form.amount.unwrap_or(financing.installment_amount);
    if !(amount.is_finite() && amount > 0.0) {
        return Err(Error::InvalidInput("amount must be positive".to_owned()));
    }

    let paid_installments = financing.paid_installments.max(form.installment_number);
    let outstanding_balance = (financing.outstanding_balance - amount).max(0.0);
    let is_fully_paid =
        paid_installments >= financing.total_installments || outstanding_balance == 0.0;

    update_financing_balance(
        id,
        paid_installments,
        outstanding_balance,
        !is_fully_paid,
        connection,
    )?;

    tracing::info!(
        "Paid installment {} of financing {id}, {outstanding_balance} outstanding",
        form.installment_number
    );

    Ok(Installment {
        financing_id: id,
        installment_number: form.installment_number,
        amount,
        due_date: installment_due_date(&financing, form.installment_number)?,
        paid_date: Some(today),
        status: InstallmentStatus::Paid,
    })
}

/// Estimate the effect of paying `amount` off the balance of `financing` now.
///
/// The estimate treats every remaining installment as a fixed payment of
/// `installment_amount`, so the interest is the difference between what the
/// remaining installments add up to and the balance they pay off.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInput] if `amount` is not positive or the balance needs
///   more installments than can be counted,
/// - or [Error::InvalidDate] if the new end date is outside the supported range.
pub fn simulate_early_payment(
    financing: &Financing,
    amount: f64,
) -> Result<EarlyPaymentSimulation, Error> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(Error::InvalidInput("amount must be positive".to_owned()));
    }

    let current_balance = financing.outstanding_balance;
    let installment_amount = financing.installment_amount;

    let remaining_now = remaining_installments(current_balance, installment_amount)?;
    let interest_before = f64::from(remaining_now) * installment_amount - current_balance;

    let new_balance = (current_balance - amount).max(0.0);
    let remaining_after = remaining_installments(new_balance, installment_amount)?;
    let interest_after = f64::from(remaining_after) * installment_amount - new_balance;

    let months_to_end = financing
        .paid_installments
        .checked_add(remaining_after)
        .ok_or_else(|| Error::InvalidInput("too many installments remaining".to_owned()))?;
    let new_end_date = YearMonth::of(financing.start_date)
        .add_months(months_to_end)
        .clamped_date(financing.start_date.day())?;

    Ok(EarlyPaymentSimulation {
        current_balance,
        early_payment_amount: amount,
        interest_saved: (interest_before - interest_after).max(0.0),
        months_saved: remaining_now.saturating_sub(remaining_after),
        new_end_date,
    })
}

/// Pay `amount` off the balance of the agreement `id`.
///
/// The agreement is deactivated when the balance reaches zero.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidInput] if `amount` is not positive,
/// - [Error::NotFound] if the agreement does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply_early_payment(
    id: FinancingId,
    amount: f64,
    connection: &Connection,
) -> Result<Financing, Error> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(Error::InvalidInput("amount must be positive".to_owned()));
    }

    let financing = get_financing(id, connection)?;
    let outstanding_balance = (financing.outstanding_balance - amount).max(0.0);

    update_financing_balance(
        id,
        financing.paid_installments,
        outstanding_balance,
        outstanding_balance > 0.0,
        connection,
    )
}

/// The number of whole installments of `installment_amount` needed to pay off `balance`.
fn remaining_installments(balance: f64, installment_amount: f64) -> Result<u32, Error> {
    if balance <= 0.0 || installment_amount <= 0.0 {
        return Ok(0);
    }

    let installments = (balance / installment_amount).ceil();
    if !installments.is_finite() || installments > f64::from(u32::MAX) {
        return Err(Error::InvalidInput(format!(
            "a balance of {balance} needs too many installments of {installment_amount}"
        )));
    }

    Ok(installments as u32)
}

//! Decides whether an obligation falls in a month and what its ledger entry looks like.

use crate::{
    Error,
    calendar::YearMonth,
    financing::Financing,
    recurring::RecurringRule,
    transaction::{Transaction, TransactionBuilder, TransactionType},
};

/// The month that a rule's installments are counted from.
///
/// This is the month of the rule's start date, or `fallback` when the rule has
/// no start date.
pub fn recurring_anchor(rule: &RecurringRule, fallback: YearMonth) -> YearMonth {
    rule.start_date.map(YearMonth::of).unwrap_or(fallback)
}

/// The ledger entry for `rule` in the month `target`, if the rule is in scope.
///
/// `anchor` is the month the rule is counted from, see [recurring_anchor]. The
/// rule is out of scope when `target` comes before `anchor`, when `target` is
/// `installments` or more months after `anchor`, or when `target` comes after
/// the month of the end date. A rule with installments but no start date is
/// never in scope since there is no fixed month to count them from.
///
/// # Errors
/// Returns [Error::InvalidDate] if the due date is outside the supported range.
pub fn recurring_occurrence(
    rule: &RecurringRule,
    anchor: YearMonth,
    target: YearMonth,
) -> Result<Option<TransactionBuilder>, Error> {
    if rule.installments.is_some() && rule.start_date.is_none() {
        return Ok(None);
    }

    let diff = anchor.months_until(target);

    if diff < 0 {
        return Ok(None);
    }

    if let Some(installments) = rule.installments {
        if diff >= i64::from(installments) {
            return Ok(None);
        }
    }

    if let Some(end_date) = rule.end_date {
        if target > YearMonth::of(end_date) {
            return Ok(None);
        }
    }

    let preferred_day = rule
        .day_of_month
        .or(rule.start_date.map(|start_date| start_date.day()))
        .unwrap_or(1);
    let date = target.clamped_date(preferred_day)?;

    Ok(Some(
        Transaction::build(rule.transaction_type, date, &rule.category)
            .description(&rule.name)
            .planned_amount(Some(rule.amount))
            .account(rule.account.clone())
            .is_fixed(true)
            .recurring_id(Some(rule.id)),
    ))
}

/// The installment of `financing` due in the month `target`, if any.
///
/// Installments run for `total_installments` months starting with the month of
/// the start date and fall on the start date's day of the month.
///
/// # Errors
/// Returns [Error::InvalidDate] if the due date is outside the supported range.
pub fn financing_occurrence(
    financing: &Financing,
    target: YearMonth,
) -> Result<Option<TransactionBuilder>, Error> {
    let diff = YearMonth::of(financing.start_date).months_until(target);

    if diff < 0 || diff >= i64::from(financing.total_installments) {
        return Ok(None);
    }

    let date = target.clamped_date(financing.start_date.day())?;

    Ok(Some(
        Transaction::build(TransactionType::Expense, date, &financing.category)
            .description(&format!("{} - Installment", financing.name))
            .planned_amount(Some(financing.installment_amount))
            .account(financing.account.clone())
            .is_fixed(true)
            .financing_id(Some(financing.id)),
    ))
}

use rusqlite::Connection;

use crate::{
    Error,
    calendar::YearMonth,
    financing::get_active_financings,
    materialize::occurrence::{financing_occurrence, recurring_anchor, recurring_occurrence},
    recurring::get_active_recurring_rules,
    transaction::insert_transaction_if_absent,
};

/// Make sure every active obligation in scope for `target` has a ledger entry
/// in that month.
///
/// Missing entries are created as planned transactions. Entries that already
/// exist are left exactly as they are, including ones the user has paid,
/// cancelled or edited, so calling this any number of times has the same effect
/// as calling it once.
///
/// Returns the number of entries created.
///
/// # Errors
/// Returns an error if the obligations cannot be read or an entry cannot be
/// written. Entries written before the failure are kept.
pub fn ensure_month(target: YearMonth, connection: &Connection) -> Result<usize, Error> {
    let mut created = 0;

    for rule in get_active_recurring_rules(connection)? {
        let anchor = recurring_anchor(&rule, target);

        if let Some(builder) = recurring_occurrence(&rule, anchor, target)? {
            if insert_transaction_if_absent(&builder, connection)? {
                created += 1;
            }
        }
    }

    for financing in get_active_financings(connection)? {
        if let Some(builder) = financing_occurrence(&financing, target)? {
            if insert_transaction_if_absent(&builder, connection)? {
                created += 1;
            }
        }
    }

    if created > 0 {
        tracing::debug!("Created {created} planned transactions for {target}");
    }

    Ok(created)
}

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    calendar::YearMonth,
    materialize::occurrence::{recurring_anchor, recurring_occurrence},
    recurring::RecurringRule,
    transaction::insert_transaction_if_absent,
};

/// How many months past the start month a rule is seeded by default.
pub const DEFAULT_MONTHS_AHEAD: u32 = 24;

/// Create the ledger entries of `rule` for the start month and the
/// `months_ahead` months after it.
///
/// The start month is the month of the rule's start date, or the month of
/// `today` for open-ended rules without one. Seeding stops early once the rule runs out of
/// installments or passes its end date. Each month gets the same entry that
/// [ensure_month](crate::materialize::ensure_month) would create for it, and
/// existing entries are left untouched. Inactive rules are not seeded.
///
/// Returns the number of entries created.
///
/// # Errors
/// Returns an error if an entry cannot be written. Entries written before the
/// failure are kept.
pub fn seed_forward(
    rule: &RecurringRule,
    months_ahead: u32,
    today: Date,
    connection: &Connection,
) -> Result<usize, Error> {
    if !rule.is_active {
        return Ok(0);
    }

    let anchor = recurring_anchor(rule, YearMonth::of(today));
    let mut created = 0;

    for offset in 0..=months_ahead {
        let target = anchor.add_months(offset);

        let Some(builder) = recurring_occurrence(rule, anchor, target)? else {
            break;
        };

        if insert_transaction_if_absent(&builder, connection)? {
            created += 1;
        }
    }

    tracing::debug!(
        "Seeded {created} planned transactions for recurring rule {} from {anchor}",
        rule.id
    );

    Ok(created)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        calendar::YearMonth,
        db::initialize,
        materialize::ensure_month,
        recurring::{NewRecurringRule, RecurringRule, create_recurring_rule},
        transaction::{
            Transaction, TRANSACTION_COLUMNS, TransactionType, count_transactions,
            map_transaction_row,
        },
    };

    use super::{DEFAULT_MONTHS_AHEAD, seed_forward};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[track_caller]
    fn must_create_rule(rule: NewRecurringRule, connection: &Connection) -> RecurringRule {
        create_recurring_rule(&rule, connection).expect("Could not create rule")
    }

    #[track_caller]
    fn all_entries(connection: &Connection) -> Vec<Transaction> {
        connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" ORDER BY date, id"
            ))
            .unwrap()
            .query_map([], map_transaction_row)
            .unwrap()
            .map(|row| row.unwrap())
            .collect()
    }

    fn strip_ids(entries: Vec<Transaction>) -> Vec<Transaction> {
        entries
            .into_iter()
            .map(|entry| Transaction { id: 0, ..entry })
            .collect()
    }

    fn rent_from_january() -> NewRecurringRule {
        NewRecurringRule {
            day_of_month: Some(31),
            start_date: Some(date!(2024 - 01 - 01)),
            ..NewRecurringRule::new("Rent", TransactionType::Expense, "Housing", 1200.0)
        }
    }

    #[test]
    fn seeds_start_month_and_months_ahead() {
        let connection = get_test_connection();
        let rule = must_create_rule(rent_from_january(), &connection);

        let created = seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2030 - 01 - 01), &connection);

        assert_eq!(created, Ok(25));
        let entries = all_entries(&connection);
        assert_eq!(entries.first().map(|e| e.date), Some(date!(2024 - 01 - 31)));
        assert_eq!(entries.last().map(|e| e.date), Some(date!(2026 - 01 - 31)));
    }

    #[test]
    fn matches_ensure_month_for_each_month() {
        let seeded = get_test_connection();
        let ensured = get_test_connection();
        let rule = must_create_rule(rent_from_january(), &seeded);
        must_create_rule(rent_from_january(), &ensured);

        seed_forward(&rule, 5, date!(2024 - 01 - 01), &seeded).unwrap();
        for month in 1..=6 {
            ensure_month(YearMonth::new(2024, month).unwrap(), &ensured).unwrap();
        }

        assert_eq!(
            strip_ids(all_entries(&seeded)),
            strip_ids(all_entries(&ensured))
        );
        assert_eq!(count_transactions(&seeded), Ok(6));
    }

    #[test]
    fn stops_at_installment_cap() {
        let connection = get_test_connection();
        let rule = must_create_rule(
            NewRecurringRule {
                installments: Some(3),
                ..rent_from_january()
            },
            &connection,
        );

        let created = seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2024 - 01 - 01), &connection);

        assert_eq!(created, Ok(3));
    }

    #[test]
    fn stops_after_end_month() {
        let connection = get_test_connection();
        let rule = must_create_rule(
            NewRecurringRule {
                end_date: Some(date!(2024 - 04 - 15)),
                ..rent_from_january()
            },
            &connection,
        );

        let created = seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2024 - 01 - 01), &connection);

        assert_eq!(created, Ok(4));
    }

    #[test]
    fn open_ended_rule_without_start_seeds_from_today() {
        let connection = get_test_connection();
        let rule = must_create_rule(
            NewRecurringRule {
                day_of_month: Some(5),
                ..NewRecurringRule::new("Gym", TransactionType::Expense, "Health", 40.0)
            },
            &connection,
        );

        seed_forward(&rule, 1, date!(2024 - 12 - 20), &connection).unwrap();

        let dates: Vec<_> = all_entries(&connection).iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date!(2024 - 12 - 05), date!(2025 - 01 - 05)]);
    }

    #[test]
    fn installments_are_capped_across_seeding_and_later_months() {
        let connection = get_test_connection();
        let mut new_rule = NewRecurringRule {
            day_of_month: Some(5),
            installments: Some(2),
            ..NewRecurringRule::new("Gym", TransactionType::Expense, "Health", 40.0)
        };
        new_rule.anchor_installments(date!(2024 - 12 - 20)).unwrap();
        let rule = must_create_rule(new_rule, &connection);

        seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2024 - 12 - 20), &connection).unwrap();
        for month in 1..=12 {
            ensure_month(YearMonth::new(2025, month).unwrap(), &connection).unwrap();
        }
        seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2025 - 06 - 01), &connection).unwrap();

        let dates: Vec<_> = all_entries(&connection).iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date!(2024 - 12 - 05), date!(2025 - 01 - 05)]);
    }

    #[test]
    fn capped_rule_without_start_is_not_seeded() {
        let connection = get_test_connection();
        let rule = must_create_rule(
            NewRecurringRule {
                installments: Some(2),
                ..NewRecurringRule::new("Gym", TransactionType::Expense, "Health", 40.0)
            },
            &connection,
        );

        seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2024 - 12 - 20), &connection).unwrap();
        ensure_month(YearMonth::new(2025, 1).unwrap(), &connection).unwrap();

        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[test]
    fn reseeding_is_idempotent() {
        let connection = get_test_connection();
        let rule = must_create_rule(rent_from_january(), &connection);

        seed_forward(&rule, 6, date!(2024 - 01 - 01), &connection).unwrap();
        let second = seed_forward(&rule, 6, date!(2024 - 01 - 01), &connection);

        assert_eq!(second, Ok(0));
        assert_eq!(count_transactions(&connection), Ok(7));
    }

    #[test]
    fn inactive_rule_is_not_seeded() {
        let connection = get_test_connection();
        let rule = must_create_rule(
            NewRecurringRule {
                is_active: false,
                ..rent_from_january()
            },
            &connection,
        );

        assert_eq!(
            seed_forward(&rule, DEFAULT_MONTHS_AHEAD, date!(2024 - 01 - 01), &connection),
            Ok(0)
        );
        assert_eq!(count_transactions(&connection), Ok(0));
    }
}

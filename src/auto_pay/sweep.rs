//! Marks planned transactions as paid once their date has arrived.

use rusqlite::Connection;
use time::Date;

use crate::{Error, transaction::TransactionStatus};

/// Mark every planned transaction dated on or before `today` as paid.
///
/// Transactions without an amount take their planned amount, or zero if that
/// is missing too. Paid and cancelled transactions are never touched, so
/// running the sweep again on the same day changes nothing.
///
/// Returns the number of transactions that were marked as paid.
///
/// # Errors
/// Returns [Error::SqlError] if the update fails.
pub fn sweep_due_transactions(today: Date, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE \"transaction\" \
             SET status = ?1, amount = COALESCE(amount, planned_amount, 0.0) \
             WHERE status = ?2 AND date <= ?3",
            (TransactionStatus::Paid, TransactionStatus::Planned, today),
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, macros::date};

    use crate::{
        db::initialize,
        transaction::{
            Transaction, TransactionStatus, TransactionType, create_transaction, get_transaction,
        },
    };

    use super::sweep_due_transactions;

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[track_caller]
    fn must_create_planned(date: time::Date, connection: &Connection) -> Transaction {
        create_transaction(
            Transaction::build(TransactionType::Expense, date, "Subscriptions")
                .planned_amount(Some(50.0)),
            connection,
        )
        .expect("could not create test transaction")
    }

    #[test]
    fn pays_transactions_that_are_due() {
        let connection = get_test_connection();
        let yesterday = must_create_planned(TODAY - Duration::days(1), &connection);
        let today = must_create_planned(TODAY, &connection);

        let count = sweep_due_transactions(TODAY, &connection).unwrap();

        assert_eq!(count, 2);
        for id in [yesterday.id, today.id] {
            let got = get_transaction(id, &connection).unwrap();
            assert_eq!(got.status, TransactionStatus::Paid);
            assert_eq!(got.amount, Some(50.0));
        }
    }

    #[test]
    fn leaves_future_transactions_planned() {
        let connection = get_test_connection();
        let tomorrow = must_create_planned(TODAY + Duration::days(1), &connection);

        let count = sweep_due_transactions(TODAY, &connection).unwrap();

        assert_eq!(count, 0);
        let got = get_transaction(tomorrow.id, &connection).unwrap();
        assert_eq!(got.status, TransactionStatus::Planned);
        assert_eq!(got.amount, None);
    }

    #[test]
    fn second_run_changes_nothing() {
        let connection = get_test_connection();
        must_create_planned(TODAY - Duration::days(3), &connection);

        assert_eq!(sweep_due_transactions(TODAY, &connection), Ok(1));
        assert_eq!(sweep_due_transactions(TODAY, &connection), Ok(0));
    }

    #[test]
    fn keeps_amount_already_set() {
        let connection = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(TransactionType::Expense, TODAY, "Utilities")
                .planned_amount(Some(100.0))
                .amount(Some(87.4)),
            &connection,
        )
        .unwrap();

        sweep_due_transactions(TODAY, &connection).unwrap();

        let got = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(got.amount, Some(87.4));
    }

    #[test]
    fn missing_amounts_become_zero() {
        let connection = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(TransactionType::Expense, TODAY, "Misc"),
            &connection,
        )
        .unwrap();

        sweep_due_transactions(TODAY, &connection).unwrap();

        let got = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(got.amount, Some(0.0));
    }

    #[test]
    fn cancelled_transactions_are_not_paid() {
        let connection = get_test_connection();
        let transaction = create_transaction(
            Transaction::build(TransactionType::Expense, TODAY - Duration::days(1), "Misc")
                .planned_amount(Some(10.0))
                .status(TransactionStatus::Cancelled),
            &connection,
        )
        .unwrap();

        assert_eq!(sweep_due_transactions(TODAY, &connection), Ok(0));
        let got = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(got.status, TransactionStatus::Cancelled);
    }
}

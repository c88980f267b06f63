use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::Duration;

use planeteur_rs::{
    DEFAULT_MONTHS_AHEAD, NewFinancing, NewRecurringRule, Transaction, TransactionStatus,
    TransactionType, YearMonth, create_financing, create_recurring_rule, create_transaction,
    ensure_month, initialize_db, local_today, seed_forward,
};

/// A utility for creating a demo database for the REST API server of planeteur_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The local timezone used to decide which month is the current one.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

/// Create and populate a database with example obligations and transactions.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let today = local_today(&args.timezone)?;
    let this_month = YearMonth::of(today);
    let first_day = this_month.first_day()?;

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating recurring rules...");

    let rules = [
        NewRecurringRule {
            day_of_month: Some(25),
            start_date: Some(first_day),
            account: Some("Checking".to_owned()),
            ..NewRecurringRule::new("Salary", TransactionType::Income, "Salary", 5200.0)
        },
        NewRecurringRule {
            day_of_month: Some(1),
            start_date: Some(first_day),
            ..NewRecurringRule::new("Rent", TransactionType::Expense, "Housing", 1850.0)
        },
        NewRecurringRule {
            day_of_month: Some(31),
            start_date: Some(first_day),
            ..NewRecurringRule::new("Power", TransactionType::Expense, "Utilities", 140.0)
        },
        NewRecurringRule {
            day_of_month: Some(12),
            start_date: Some(first_day),
            installments: Some(6),
            ..NewRecurringRule::new("Gym membership", TransactionType::Expense, "Health", 45.0)
        },
    ];

    for new_rule in &rules {
        let rule = create_recurring_rule(new_rule, &conn)?;
        let seeded = seed_forward(&rule, DEFAULT_MONTHS_AHEAD, today, &conn)?;
        println!("  {} ({seeded} months)", rule.name);
    }

    println!("Creating financing agreements...");

    let laptop = create_financing(
        &NewFinancing {
            interest_rate: 1.5,
            ..NewFinancing::new("Laptop", 210.0, 12, first_day + Duration::days(9))
        },
        &conn,
    )?;
    println!("  {}", laptop.name);

    println!("Creating one-off transactions...");

    create_transaction(
        Transaction::build(TransactionType::Expense, today, "Groceries")
            .description("Weekly shop")
            .planned_amount(Some(180.0))
            .amount(Some(164.35))
            .status(TransactionStatus::Paid),
        &conn,
    )?;
    create_transaction(
        Transaction::build(TransactionType::Expense, today, "Dining")
            .description("Dinner out")
            .planned_amount(Some(80.0)),
        &conn,
    )?;

    let added = ensure_month(this_month, &conn)?;
    println!("Materialized {added} entries for {this_month}");

    println!("Success!");

    Ok(())
}

use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use expense_analytics::{
    ExpenseRecord, ExpenseStore, OwnerId, SQLiteExpenseStore, initialize_db,
};

const CATEGORIES: [(&str, &str, f64); 5] = [
    ("Groceries", "Supermarket", 85.40),
    ("Transport", "Bus fare", 4.20),
    ("Eating out", "Lunch", 18.50),
    ("Rent", "Weekly rent", 450.0),
    ("Entertainment", "Movie tickets", 32.0),
];

/// A utility for creating a test database for expense_analytics.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the user that owns the generated expenses.
    #[arg(long, default_value_t = 1)]
    owner: i64,

    /// How many days of expenses to generate, ending today.
    #[arg(long, default_value_t = 120)]
    days: u32,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating {} days of expenses...", args.days);

    let store = SQLiteExpenseStore::new(Arc::new(Mutex::new(conn)));
    let owner = OwnerId::new(args.owner);
    let now = OffsetDateTime::now_utc();

    for day in 0..args.days {
        let incurred_on = now - Duration::days(i64::from(day));
        // Cycle through the categories so every month has a spread of them.
        let (category, title, amount) = CATEGORIES[day as usize % CATEGORIES.len()];
        let amount = amount + f64::from(day % 7);

        store.create(
            owner,
            ExpenseRecord::build(title, amount, category).incurred_on(incurred_on),
            now,
        )?;
    }

    println!("Success!");

    Ok(())
}

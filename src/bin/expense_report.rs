use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description,
};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use expense_analytics::{
    ExpenseAnalytics, ExpenseId, ExpenseRecord, LocalTimezone, NewExpense, OwnerId,
    PeriodPreviewView, SQLiteExpenseStore, SystemClock, category_summary_views,
    category_total_points, daily_plot_points, initialize_db, monthly_total_points,
    parse_target_month,
};

/// Prints expense analytics for one user as JSON.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The ID of the user whose expenses to report on.
    #[arg(long)]
    owner: i64,

    /// The canonical timezone calendar boundaries are computed in, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Spending this month, today and yesterday.
    Preview,
    /// Each category's average monthly spend next to its spend this month.
    Categories,
    /// The expenses of a month by day, e.g. `daily 2024-06`.
    Daily {
        /// The month to plot, as YYYY-MM, YYYY-MM-DD or an RFC 3339 timestamp.
        month: String,
    },
    /// Spending per category from one day to another, both included.
    Totals {
        /// The first day, as YYYY-MM-DD.
        #[arg(value_parser = parse_date)]
        first: Date,
        /// The last day, as YYYY-MM-DD.
        #[arg(value_parser = parse_date)]
        last: Date,
    },
    /// Spending per month of a year.
    Yearly {
        /// The calendar year.
        year: i32,
    },
    /// The expenses from one day to another, both included, oldest first.
    List {
        /// The first day, as YYYY-MM-DD.
        #[arg(value_parser = parse_date)]
        first: Date,
        /// The last day, as YYYY-MM-DD.
        #[arg(value_parser = parse_date)]
        last: Date,
    },
    /// Record a new expense.
    Add {
        /// A short label for the expense.
        title: String,
        /// The amount spent.
        amount: f64,
        /// The expense category.
        category: String,
        /// When the money was spent, as an RFC 3339 timestamp. Defaults to now.
        #[arg(long, value_parser = parse_timestamp)]
        incurred_on: Option<OffsetDateTime>,
        /// Optional notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Replace the details of an expense.
    Update {
        /// The ID of the expense.
        id: ExpenseId,
        /// A short label for the expense.
        title: String,
        /// The amount spent.
        amount: f64,
        /// The expense category.
        category: String,
        /// When the money was spent, as an RFC 3339 timestamp. Keeps the stored time if omitted.
        #[arg(long, value_parser = parse_timestamp)]
        incurred_on: Option<OffsetDateTime>,
        /// Optional notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an expense.
    Remove {
        /// The ID of the expense.
        id: ExpenseId,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let timezone = LocalTimezone::from_name(&args.timezone)?;
    let owner = OwnerId::new(args.owner);

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;
    let store = SQLiteExpenseStore::new(Arc::new(Mutex::new(conn)));
    let analytics = ExpenseAnalytics::new(store, SystemClock, timezone);

    tracing::debug!("running {:?} for owner {owner} in {}", args.command, timezone.name());

    match args.command {
        Command::Preview => {
            print_json(&PeriodPreviewView::from(analytics.current_period_preview(owner)?))
        }
        Command::Categories => print_json(&category_summary_views(
            analytics.category_average_vs_total(owner)?,
        )),
        Command::Daily { month } => {
            let month = parse_target_month(&month)?;
            print_json(&daily_plot_points(&analytics.daily_series(owner, Some(month))?))
        }
        Command::Totals { first, last } => print_json(&category_total_points(
            analytics.category_totals(owner, first, last)?,
        )),
        Command::Yearly { year } => {
            print_json(&monthly_total_points(&analytics.yearly_totals(owner, Some(year))?))
        }
        Command::List { first, last } => print_json(&analytics.list_expenses(owner, first, last)?),
        Command::Add {
            title,
            amount,
            category,
            incurred_on,
            notes,
        } => {
            let expense = build_expense(&title, amount, &category, incurred_on, notes);
            print_json(&analytics.record_expense(owner, expense)?)
        }
        Command::Update {
            id,
            title,
            amount,
            category,
            incurred_on,
            notes,
        } => {
            let expense = build_expense(&title, amount, &category, incurred_on, notes);
            print_json(&analytics.update_expense(owner, id, expense)?)
        }
        Command::Remove { id } => print_json(&analytics.remove_expense(owner, id)?),
    }
}

fn build_expense(
    title: &str,
    amount: f64,
    category: &str,
    incurred_on: Option<OffsetDateTime>,
    notes: Option<String>,
) -> NewExpense {
    let mut expense = ExpenseRecord::build(title, amount, category);
    if let Some(incurred_on) = incurred_on {
        expense = expense.incurred_on(incurred_on);
    }
    if let Some(notes) = notes {
        expense = expense.notes(&notes);
    }

    expense
}

fn setup_logging() {
    // Logs go to stderr so that stdout only carries the report.
    let stderr_log = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(filter))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("could not parse \"{text}\" as a date: {error}"))
}

fn parse_timestamp(text: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|error| format!("could not parse \"{text}\" as a timestamp: {error}"))
}

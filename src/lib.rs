//! Expense analytics turns a user's recorded expenses into time-bucketed
//! summaries.
//!
//! The [ExpenseAnalytics] engine derives three views from the records of one
//! owner:
//! - a snapshot of spending this month, today and yesterday,
//! - each category's average monthly spend next to its spend this month,
//! - and the individual expenses of a month as a plottable daily series.
//!
//! Records live behind the [ExpenseStore] trait. This crate ships an in-memory
//! store and a SQLite store.

#![warn(missing_docs)]

use time::Date;

mod analytics;
mod calendar;
mod clock;
mod database_id;
mod db;
mod expense;
mod owner;
mod presentation;
mod store;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use analytics::{
    CategorySummary, CategoryTotal, DailyPoint, ExpenseAnalytics, MonthlyTotal, PeriodPreview,
};
pub use calendar::{
    MonthKey, Window, date_range_bounds, day_bounds, month_bounds, parse_target_month,
    today_bounds, year_bounds, yesterday_bounds,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use database_id::{DatabaseId, ExpenseId};
pub use db::initialize as initialize_db;
pub use expense::{ExpenseRecord, NewExpense};
pub use owner::OwnerId;
pub use presentation::{
    CategoryPoint, CategorySummaryView, PeriodPreviewView, PlotPoint, category_summary_views,
    category_total_points, daily_plot_points, monthly_total_points,
};
pub use store::{
    AggregateQuery, Bucket, BucketKey, Clause, Comparator, ExpenseStore, Filters, GroupKey,
    GroupStage, MemoryExpenseStore, RecordOrder, Reducer, SQLiteExpenseStore,
};
pub use timezone::LocalTimezone;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The daily series was requested without saying which month to plot.
    ///
    /// The month is never defaulted to the current one, callers must be
    /// explicit.
    #[error("a target month is required")]
    MissingTargetMonth,

    /// Monthly totals were requested without saying which year to summarise.
    #[error("a year is required")]
    MissingYear,

    /// The text could not be parsed as a month.
    ///
    /// Accepted forms are `YYYY-MM`, `YYYY-MM-DD` and RFC 3339 timestamps.
    #[error("could not parse \"{0}\" as a month")]
    InvalidMonth(String),

    /// The last day of a date range came before its first day.
    #[error("the date range {first} to {last} ends before it starts")]
    InvalidDateRange {
        /// The first day of the range.
        first: Date,
        /// The last day of the range.
        last: Date,
    },

    /// A calendar boundary fell outside the range of representable dates.
    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An expense title was empty after trimming whitespace.
    #[error("expense title cannot be empty")]
    EmptyTitle,

    /// An expense category was empty after trimming whitespace.
    #[error("expense category cannot be empty")]
    EmptyCategory,

    /// An expense amount was negative or not a finite number.
    #[error("{0} is not a valid expense amount, amounts must be zero or more")]
    InvalidAmount(f64),

    /// An aggregate query asked for a grouping that cannot be computed, for
    /// example re-grouping category totals by month.
    #[error("invalid grouping: {0}")]
    InvalidGrouping(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The expense exists but belongs to a different owner.
    #[error("the expense belongs to another user")]
    Forbidden,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The record store failed while computing an analytic view.
    ///
    /// The underlying error is logged where it happens, the message is kept
    /// for display only.
    #[error("the expense store failed: {0}")]
    StoreFailure(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<time::error::ComponentRange> for Error {
    fn from(value: time::error::ComponentRange) -> Self {
        Error::DateOutOfRange(value.to_string())
    }
}

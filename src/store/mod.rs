//! The record store contract the analytics are built on.
//!
//! A store filters an owner's expenses with [Filters] and reduces them to
//! [Bucket]s following an [AggregateQuery]. The engine never touches storage
//! directly.

mod memory;
mod pipeline;
mod sqlite;

use std::fmt::Display;

use time::OffsetDateTime;

pub use memory::MemoryExpenseStore;
pub use sqlite::SQLiteExpenseStore;

use crate::{
    Error,
    calendar::{MonthKey, Window},
    database_id::ExpenseId,
    expense::{ExpenseRecord, NewExpense},
    owner::OwnerId,
    timezone::LocalTimezone,
};

/// Handles the storage, retrieval and aggregation of expenses.
///
/// Every method is scoped to one owner, a store must never return or change
/// another owner's records.
pub trait ExpenseStore {
    /// Create a new expense owned by `owner`.
    ///
    /// `now` becomes the creation time, and the incurred time if the builder
    /// does not set one.
    ///
    /// # Errors
    /// Returns an error if the expense breaks a record invariant or the store fails.
    fn create(
        &self,
        owner: OwnerId,
        expense: NewExpense,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error>;

    /// Retrieve one of `owner`'s expenses.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not exist and [Error::Forbidden]
    /// if it belongs to someone else.
    fn get(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error>;

    /// Replace the user supplied fields of one of `owner`'s expenses.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not exist, [Error::Forbidden]
    /// if it belongs to someone else, or an invariant error for bad fields.
    fn update(
        &self,
        owner: OwnerId,
        id: ExpenseId,
        expense: NewExpense,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error>;

    /// Delete one of `owner`'s expenses, returning the deleted record.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not exist and [Error::Forbidden]
    /// if it belongs to someone else.
    fn delete(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error>;

    /// Retrieve `owner`'s expenses that match `filters`.
    fn records(
        &self,
        owner: OwnerId,
        filters: &Filters,
        order: RecordOrder,
    ) -> Result<Vec<ExpenseRecord>, Error>;

    /// Group and reduce `owner`'s expenses as described by `query`.
    ///
    /// Buckets are sorted by key. A group with no records has no bucket.
    fn aggregate(&self, owner: OwnerId, query: &AggregateQuery) -> Result<Vec<Bucket>, Error>;
}

/// How a filter clause compares a field against its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// The field equals the bound.
    Equal,
    /// The field is greater than or equal to the bound.
    GreaterOrEqual,
    /// The field is strictly less than the bound.
    Less,
}

impl Comparator {
    fn compare<T: PartialOrd + ?Sized>(self, value: &T, bound: &T) -> bool {
        match self {
            Self::Equal => value == bound,
            Self::GreaterOrEqual => value >= bound,
            Self::Less => value < bound,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
        }
    }
}

/// A single `(field, comparator, bound)` condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Compare the instant the expense was incurred.
    IncurredOn(Comparator, OffsetDateTime),
    /// Compare the expense category.
    Category(Comparator, String),
}

impl Clause {
    fn matches(&self, record: &ExpenseRecord) -> bool {
        match self {
            Self::IncurredOn(comparator, bound) => comparator.compare(&record.incurred_on, bound),
            Self::Category(comparator, bound) => {
                comparator.compare(record.category.as_str(), bound.as_str())
            }
        }
    }
}

/// A conjunction of [Clause]s. No clauses matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    clauses: Vec<Clause>,
}

impl Filters {
    /// Filters that match every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause.
    pub fn with(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Only match expenses incurred inside `window`.
    pub fn within(self, window: Window) -> Self {
        self.with(Clause::IncurredOn(Comparator::GreaterOrEqual, window.start))
            .with(Clause::IncurredOn(Comparator::Less, window.end))
    }

    /// Only match expenses in `category`.
    pub fn category(self, category: &str) -> Self {
        self.with(Clause::Category(Comparator::Equal, category.to_owned()))
    }

    /// The clauses, all of which must hold.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether `record` satisfies every clause.
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        self.clauses.iter().all(|clause| clause.matches(record))
    }
}

/// What to group expenses, or the buckets of a previous stage, by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Everything in one group.
    All,
    /// The expense category.
    Category,
    /// The local calendar month the expense was incurred in.
    Month,
    /// The local day of the month the expense was incurred on.
    DayOfMonth,
    /// The category and the local calendar month together.
    CategoryAndMonth,
}

/// How the amounts in a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Add the values up.
    Sum,
    /// Count the values.
    Count,
    /// The mean of the values.
    Average,
}

/// One grouping step of an [AggregateQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupStage {
    /// What to group by.
    pub key: GroupKey,
    /// How to combine the values in each group.
    pub reducer: Reducer,
}

/// A filtered, multi-stage grouping of expenses.
///
/// The first stage groups matching records and reduces their amounts. Each
/// later stage groups the previous stage's buckets by a coarser key and
/// reduces their values, e.g. summing by `(category, month)` and then
/// averaging by category gives each category's average monthly spend.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    /// Which records take part.
    pub filters: Filters,
    /// The grouping steps, applied in order.
    pub stages: Vec<GroupStage>,
    /// The timezone calendar keys are computed in.
    pub timezone: LocalTimezone,
}

impl AggregateQuery {
    /// A query over the records matching `filters`, with no stages yet.
    pub fn new(filters: Filters, timezone: LocalTimezone) -> Self {
        Self {
            filters,
            stages: Vec::new(),
            timezone,
        }
    }

    /// Append a grouping stage.
    pub fn group(mut self, key: GroupKey, reducer: Reducer) -> Self {
        self.stages.push(GroupStage { key, reducer });
        self
    }
}

/// The key of a [Bucket].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    /// The single group of [GroupKey::All].
    All,
    /// A category.
    Category(String),
    /// A calendar month.
    Month(MonthKey),
    /// A day of the month, 1 to 31.
    DayOfMonth(u8),
    /// A category within a calendar month.
    CategoryAndMonth(String, MonthKey),
}

impl BucketKey {
    /// Derive the coarser `key` from this one, if it can be derived.
    fn project(&self, key: GroupKey) -> Option<BucketKey> {
        match (self, key) {
            (_, GroupKey::All) => Some(BucketKey::All),
            (Self::Category(category), GroupKey::Category)
            | (Self::CategoryAndMonth(category, _), GroupKey::Category) => {
                Some(BucketKey::Category(category.clone()))
            }
            (Self::Month(month), GroupKey::Month)
            | (Self::CategoryAndMonth(_, month), GroupKey::Month) => Some(BucketKey::Month(*month)),
            (Self::DayOfMonth(day), GroupKey::DayOfMonth) => Some(BucketKey::DayOfMonth(*day)),
            (Self::CategoryAndMonth(..), GroupKey::CategoryAndMonth) => Some(self.clone()),
            _ => None,
        }
    }
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Category(category) => write!(f, "{category}"),
            Self::Month(month) => write!(f, "{}-{:02}", month.year, month.month),
            Self::DayOfMonth(day) => write!(f, "day {day}"),
            Self::CategoryAndMonth(category, month) => {
                write!(f, "{category} {}-{:02}", month.year, month.month)
            }
        }
    }
}

/// One group of an aggregate and its reduced value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// The group.
    pub key: BucketKey,
    /// The reduced value of the group.
    pub value: f64,
}

/// The order [ExpenseStore::records] returns expenses in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// The order the expenses were created in.
    #[default]
    Stored,
    /// Oldest incurred first.
    IncurredAscending,
    /// Newest incurred first.
    IncurredDescending,
}

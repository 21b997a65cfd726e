//! Defines the expense record and the builder used to create and update one.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{Error, database_id::ExpenseId, owner::OwnerId};

const MAX_OFFSET: Duration = Duration::hours(26);

/// A single spending event.
///
/// To create a new expense, use [ExpenseRecord::build] and hand the builder
/// to an [ExpenseStore](crate::ExpenseStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that recorded the expense.
    pub owner: OwnerId,
    /// A short label for the expense.
    pub title: String,
    /// The amount of money spent, never negative.
    pub amount: f64,
    /// A free-form category, e.g. "Groceries".
    pub category: String,
    /// Optional notes about the expense.
    pub notes: Option<String>,
    /// When the money was spent. Every analytic view buckets by this instant.
    #[serde(with = "time::serde::rfc3339")]
    pub incurred_on: OffsetDateTime,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed, if ever.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl ExpenseRecord {
    /// Start building a new expense.
    ///
    /// Shortcut for [NewExpense] for discoverability.
    pub fn build(title: &str, amount: f64, category: &str) -> NewExpense {
        NewExpense {
            title: title.to_owned(),
            amount,
            category: category.to_owned(),
            notes: None,
            incurred_on: None,
        }
    }
}

/// The user supplied fields of an expense.
///
/// Used both to create an expense and to replace the fields of an existing
/// one. When `incurred_on` is not set, a new expense is dated at its creation
/// time and an updated expense keeps its original date.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// A short label, must not be blank.
    pub title: String,
    /// The amount spent, must be zero or more.
    pub amount: f64,
    /// The category, must not be blank.
    pub category: String,
    /// Optional notes.
    pub notes: Option<String>,
    /// When the money was spent.
    pub incurred_on: Option<OffsetDateTime>,
}

impl NewExpense {
    /// Set when the money was spent.
    pub fn incurred_on(mut self, incurred_on: OffsetDateTime) -> Self {
        self.incurred_on = Some(incurred_on);
        self
    }

    /// Set the notes for the expense.
    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_owned());
        self
    }

    /// Trim the text fields and check the record invariants.
    ///
    /// Instants are truncated to whole seconds, the precision every store
    /// keeps.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::EmptyTitle] if the title is blank,
    /// - [Error::EmptyCategory] if the category is blank,
    /// - [Error::InvalidAmount] if the amount is negative or not finite,
    /// - [Error::DateOutOfRange] if the incurred time is too close to the
    ///   limits of the calendar to have a local date in every timezone.
    pub(crate) fn validate(self) -> Result<ValidExpense, Error> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_owned);

        Ok(ValidExpense {
            title: title.to_owned(),
            amount: self.amount,
            category: category.to_owned(),
            notes,
            incurred_on: self.incurred_on.map(storable_instant).transpose()?,
        })
    }
}

/// A [NewExpense] that satisfies the record invariants.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidExpense {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub notes: Option<String>,
    pub incurred_on: Option<OffsetDateTime>,
}

impl ValidExpense {
    /// Build the stored record for a newly created expense.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if `now` cannot be stored.
    pub(crate) fn into_record(
        self,
        id: ExpenseId,
        owner: OwnerId,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error> {
        let now = storable_instant(now)?;

        Ok(ExpenseRecord {
            id,
            owner,
            title: self.title,
            amount: self.amount,
            category: self.category,
            notes: self.notes,
            incurred_on: self.incurred_on.unwrap_or(now),
            created_at: now,
            updated_at: None,
        })
    }

    /// Overwrite the user supplied fields of `record`.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if `now` cannot be stored, `record` is
    /// left unchanged.
    pub(crate) fn apply_to(
        self,
        record: &mut ExpenseRecord,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        let now = storable_instant(now)?;

        record.title = self.title;
        record.amount = self.amount;
        record.category = self.category;
        record.notes = self.notes;
        if let Some(incurred_on) = self.incurred_on {
            record.incurred_on = incurred_on;
        }
        record.updated_at = Some(now);

        Ok(())
    }
}

/// Drop the sub-second part of `instant` and express it in UTC.
///
/// The instant must stay representable when shifted by any UTC offset, so
/// that it has a local date in every timezone.
fn storable_instant(instant: OffsetDateTime) -> Result<OffsetDateTime, Error> {
    let out_of_range = || Error::DateOutOfRange(format!("{instant} cannot be stored"));

    let utc = instant
        .checked_to_offset(UtcOffset::UTC)
        .ok_or_else(out_of_range)?
        .replace_nanosecond(0)?;

    // UTC offsets never reach 26 hours.
    if utc.checked_add(MAX_OFFSET).is_none() || utc.checked_sub(MAX_OFFSET).is_none() {
        return Err(out_of_range());
    }

    Ok(utc)
}

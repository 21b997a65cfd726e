//! Fixtures shared by the unit tests.

use time::OffsetDateTime;

use crate::{expense::ExpenseRecord, owner::OwnerId, timezone::LocalTimezone};

pub fn utc() -> LocalTimezone {
    LocalTimezone::from_name("Etc/UTC").unwrap()
}

pub fn auckland() -> LocalTimezone {
    LocalTimezone::from_name("Pacific/Auckland").unwrap()
}

/// A stored expense with placeholder bookkeeping fields.
pub fn expense_record(
    owner_id: i64,
    category: &str,
    amount: f64,
    incurred_on: OffsetDateTime,
) -> ExpenseRecord {
    ExpenseRecord {
        id: 1,
        owner: OwnerId::new(owner_id),
        title: "Test".to_owned(),
        amount,
        category: category.to_owned(),
        notes: None,
        incurred_on,
        created_at: incurred_on,
        updated_at: None,
    }
}

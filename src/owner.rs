//! The identity every expense query is scoped by.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A newtype wrapper for the ID of the user that owns an expense.
///
/// Authentication happens upstream, the analytics only ever receive the ID of
/// the already authenticated user and scope every query by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct OwnerId(i64);

impl OwnerId {
    /// Create a new owner ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the owner ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

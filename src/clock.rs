//! The source of "now" for the analytics engine.

use time::OffsetDateTime;

/// Supplies the current instant.
///
/// The engine never reads the wall clock directly so that every view is a
/// function of its inputs.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;
}

/// Reads the system clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

//! Local timezone handling.
//!
//! Every calendar boundary and every bucket key is computed in one configured
//! timezone. Offsets are looked up per instant so that daylight saving changes
//! are respected.

use std::fmt::Debug;

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// A timezone from the IANA database, e.g. "Pacific/Auckland".
#[derive(Clone, Copy)]
pub struct LocalTimezone {
    tz: &'static Tz,
}

impl LocalTimezone {
    /// Look up a timezone by its canonical name.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the name is not a known timezone.
    pub fn from_name(canonical_timezone: &str) -> Result<Self, Error> {
        time_tz::timezones::get_by_name(canonical_timezone)
            .map(|tz| Self { tz })
            .ok_or_else(|| {
                tracing::error!("Invalid timezone {}", canonical_timezone);
                Error::InvalidTimezoneError(canonical_timezone.to_owned())
            })
    }

    /// The canonical name of the timezone.
    pub fn name(&self) -> &str {
        self.tz.name()
    }

    /// The UTC offset in effect at `instant`.
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        self.tz.get_offset_utc(&instant).to_utc()
    }

    /// Convert `instant` to local time.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if the local time is not representable.
    pub fn to_local(&self, instant: OffsetDateTime) -> Result<OffsetDateTime, Error> {
        instant
            .checked_to_offset(self.offset_at(instant))
            .ok_or_else(|| Error::DateOutOfRange(format!("{instant} in {}", self.name())))
    }

    /// The local calendar date of `instant`.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if the local time is not representable.
    pub fn local_date(&self, instant: OffsetDateTime) -> Result<Date, Error> {
        Ok(self.to_local(instant)?.date())
    }

    /// The first instant whose local date is `date`.
    ///
    /// This is local midnight, unless a transition skips midnight, in which
    /// case the day starts at the transition.
    ///
    /// # Errors
    /// Returns [Error::DateOutOfRange] if the local time is not representable.
    pub fn start_of_day(&self, date: Date) -> Result<OffsetDateTime, Error> {
        let local_midnight = PrimitiveDateTime::new(date, Time::MIDNIGHT);
        let guess_offset = self.offset_at(local_midnight.assume_utc());
        let first_guess = local_midnight.assume_offset(guess_offset);
        let second_guess = local_midnight.assume_offset(self.offset_at(first_guess));

        let mut candidates = Vec::with_capacity(2);
        for candidate in [first_guess, second_guess] {
            if self.to_local(candidate)?.date() == date {
                candidates.push(candidate);
            }
        }

        // A repeated midnight is valid under both offsets, the day starts at the earlier one.
        let Some(&after) = candidates.iter().min() else {
            return Err(Error::DateOutOfRange(format!(
                "no start of day for {date} in {}",
                self.name()
            )));
        };

        if self.to_local(after)?.time() == Time::MIDNIGHT {
            return Ok(after);
        }

        // Midnight was skipped. The guess before the day started brackets the transition.
        let before = match [first_guess, second_guess]
            .into_iter()
            .filter(|guess| *guess < after)
            .min()
        {
            Some(before) => before,
            None => after
                .checked_sub(Duration::DAY)
                .ok_or_else(|| Error::DateOutOfRange(format!("the day before {date}")))?,
        };

        self.first_instant_on(date, before, after)
    }

    /// Search the seconds in `(before, after]` for the first instant on `date`.
    fn first_instant_on(
        &self,
        date: Date,
        mut before: OffsetDateTime,
        mut after: OffsetDateTime,
    ) -> Result<OffsetDateTime, Error> {
        while after - before > Duration::SECOND {
            let middle: OffsetDateTime = before + (after - before) / 2;
            let middle = middle.replace_nanosecond(0)?;

            if self.to_local(middle)?.date() >= date {
                after = middle;
            } else {
                before = middle;
            }
        }

        Ok(after)
    }
}

impl Debug for LocalTimezone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LocalTimezone").field(&self.name()).finish()
    }
}

impl PartialEq for LocalTimezone {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

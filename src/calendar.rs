//! Calendar windows for the analytic queries.
//!
//! A [Window] is a half-open range of instants, `[start, end)`, so a record
//! that lands exactly on a boundary is counted in exactly one window. Windows
//! are computed from local calendar dates in a [LocalTimezone].

use serde::{Deserialize, Serialize};
use time::{
    Date, Duration, Month, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{Error, timezone::LocalTimezone};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// A half-open range of instants, `start <= instant < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// The first instant in the window.
    pub start: OffsetDateTime,
    /// The first instant after the window.
    pub end: OffsetDateTime,
}

impl Window {
    /// Whether `instant` falls inside the window.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// A calendar month, used as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    /// The calendar year.
    pub year: i32,
    /// The month number, 1 for January through 12 for December.
    pub month: u8,
}

impl MonthKey {
    /// The month that `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }
}

/// The window covering the calendar month that contains `date`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the following month is not representable.
pub fn month_bounds(date: Date, timezone: LocalTimezone) -> Result<Window, Error> {
    let first_day = date.replace_day(1)?;
    let next_first_day = first_of_next_month(first_day)?;

    Ok(Window {
        start: timezone.start_of_day(first_day)?,
        end: timezone.start_of_day(next_first_day)?,
    })
}

/// The window covering the calendar day `date`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the following day is not representable.
pub fn day_bounds(date: Date, timezone: LocalTimezone) -> Result<Window, Error> {
    let next_day = next_day(date)?;

    Ok(Window {
        start: timezone.start_of_day(date)?,
        end: timezone.start_of_day(next_day)?,
    })
}

/// The window covering the local day that `now` falls on.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the following day is not representable.
pub fn today_bounds(now: OffsetDateTime, timezone: LocalTimezone) -> Result<Window, Error> {
    day_bounds(timezone.local_date(now)?, timezone)
}

/// The window covering the local day before the one `now` falls on.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the previous day is not representable.
pub fn yesterday_bounds(now: OffsetDateTime, timezone: LocalTimezone) -> Result<Window, Error> {
    let today = timezone.local_date(now)?;
    let yesterday = today
        .previous_day()
        .ok_or_else(|| Error::DateOutOfRange(format!("the day before {today}")))?;

    day_bounds(yesterday, timezone)
}

/// The window covering the calendar year `year`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the year is not representable.
pub fn year_bounds(year: i32, timezone: LocalTimezone) -> Result<Window, Error> {
    let first_day = Date::from_calendar_date(year, Month::January, 1)?;
    let next_first_day = Date::from_calendar_date(year + 1, Month::January, 1)?;

    Ok(Window {
        start: timezone.start_of_day(first_day)?,
        end: timezone.start_of_day(next_first_day)?,
    })
}

/// The window covering the whole days from `first` to `last`, both included.
///
/// # Errors
/// Returns:
/// - [Error::InvalidDateRange] if `last` is before `first`,
/// - [Error::DateOutOfRange] if the day after `last` is not representable.
pub fn date_range_bounds(
    first: Date,
    last: Date,
    timezone: LocalTimezone,
) -> Result<Window, Error> {
    if last < first {
        return Err(Error::InvalidDateRange { first, last });
    }

    Ok(Window {
        start: timezone.start_of_day(first)?,
        end: timezone.start_of_day(next_day(last)?)?,
    })
}

/// Parse the month a caller asked for.
///
/// Accepts `YYYY-MM`, `YYYY-MM-DD` or an RFC 3339 timestamp. The returned
/// date is only meaningful for its year and month.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `text` matches none of the formats.
pub fn parse_target_month(text: &str) -> Result<Date, Error> {
    let text = text.trim();

    if let Ok(date) = Date::parse(text, DATE_FORMAT) {
        return Ok(date);
    }

    if let Ok(timestamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(timestamp.date());
    }

    Date::parse(&format!("{text}-01"), DATE_FORMAT)
        .map_err(|_| Error::InvalidMonth(text.to_owned()))
}

fn first_of_next_month(first_day: Date) -> Result<Date, Error> {
    let (year, month) = match first_day.month() {
        Month::December => (first_day.year() + 1, Month::January),
        month => (first_day.year(), month.next()),
    };

    Ok(Date::from_calendar_date(year, month, 1)?)
}

fn next_day(date: Date) -> Result<Date, Error> {
    date.checked_add(Duration::days(1))
        .ok_or_else(|| Error::DateOutOfRange(format!("the day after {date}")))
}

#[cfg(test)]
mod tests {
    use time::{
        Duration,
        macros::{date, datetime},
    };

    use super::{
        MonthKey, date_range_bounds, day_bounds, month_bounds, parse_target_month, today_bounds,
        year_bounds, yesterday_bounds,
    };
    use crate::{
        Error,
        test_utils::{auckland, utc},
        timezone::LocalTimezone,
    };

    #[test]
    fn month_bounds_cover_whole_month() {
        let window = month_bounds(date!(2024 - 02 - 17), utc()).unwrap();

        assert_eq!(window.start, datetime!(2024-02-01 0:00 UTC));
        assert_eq!(window.end, datetime!(2024-03-01 0:00 UTC));
    }

    #[test]
    fn month_bounds_roll_over_the_year() {
        let window = month_bounds(date!(2023 - 12 - 31), utc()).unwrap();

        assert_eq!(window.start, datetime!(2023-12-01 0:00 UTC));
        assert_eq!(window.end, datetime!(2024-01-01 0:00 UTC));
    }

    #[test]
    fn month_end_is_next_month_start() {
        let timezone = auckland();
        let last_days = [
            date!(2024 - 01 - 31),
            date!(2024 - 02 - 29),
            date!(2023 - 02 - 28),
            date!(2024 - 04 - 30),
            date!(2024 - 09 - 30),
            date!(2024 - 12 - 31),
        ];

        for last_day in last_days {
            let this_month = month_bounds(last_day, timezone).unwrap();
            let next_month = month_bounds(last_day + Duration::days(1), timezone).unwrap();

            assert_eq!(
                this_month.end, next_month.start,
                "month containing {last_day} should end where the next one starts"
            );
        }
    }

    #[test]
    fn windows_are_half_open() {
        let window = month_bounds(date!(2024 - 05 - 10), utc()).unwrap();

        assert!(window.contains(datetime!(2024-05-01 0:00 UTC)));
        assert!(window.contains(datetime!(2024-05-31 23:59:59 UTC)));
        assert!(!window.contains(datetime!(2024-06-01 0:00 UTC)));
        assert!(!window.contains(datetime!(2024-04-30 23:59:59 UTC)));
    }

    #[test]
    fn month_bounds_use_local_midnight() {
        let window = month_bounds(date!(2024 - 07 - 15), auckland()).unwrap();

        assert_eq!(window.start, datetime!(2024-06-30 12:00 UTC));
        assert_eq!(window.end, datetime!(2024-07-31 12:00 UTC));
    }

    #[test]
    fn day_bounds_cover_one_day() {
        let window = day_bounds(date!(2024 - 02 - 29), utc()).unwrap();

        assert_eq!(window.start, datetime!(2024-02-29 0:00 UTC));
        assert_eq!(window.end, datetime!(2024-03-01 0:00 UTC));
    }

    #[test]
    fn day_bounds_are_23_hours_when_clocks_go_forward() {
        let window = day_bounds(date!(2024 - 09 - 29), auckland()).unwrap();

        assert_eq!(window.end - window.start, Duration::hours(23));
    }

    #[test]
    fn day_bounds_agree_with_local_date_when_midnight_is_skipped() {
        let santiago = LocalTimezone::from_name("America/Santiago").unwrap();
        // 03:30 UTC is still 23:30 on the 7th, the clocks jump at 04:00 UTC.
        let late_on_the_7th = datetime!(2024-09-08 3:30 UTC);

        let window = day_bounds(date!(2024 - 09 - 08), santiago).unwrap();
        let yesterday = yesterday_bounds(datetime!(2024-09-08 12:00 UTC), santiago).unwrap();

        assert_eq!(window.start, datetime!(2024-09-08 4:00 UTC));
        assert_eq!(window.end - window.start, Duration::hours(23));
        assert!(!window.contains(late_on_the_7th));
        assert!(yesterday.contains(late_on_the_7th));
        assert_eq!(yesterday.end, window.start);
    }

    #[test]
    fn today_and_yesterday_follow_local_date() {
        // 11pm UTC on the 9th is already the 10th in Auckland.
        let now = datetime!(2024-05-09 23:00 UTC);

        let today = today_bounds(now, auckland()).unwrap();
        let yesterday = yesterday_bounds(now, auckland()).unwrap();

        assert_eq!(today.start, datetime!(2024-05-09 12:00 UTC));
        assert_eq!(today.end, datetime!(2024-05-10 12:00 UTC));
        assert_eq!(yesterday.start, datetime!(2024-05-08 12:00 UTC));
        assert_eq!(yesterday.end, today.start);
    }

    #[test]
    fn yesterday_crosses_month_boundary() {
        let yesterday = yesterday_bounds(datetime!(2024-03-01 08:00 UTC), utc()).unwrap();

        assert_eq!(yesterday.start, datetime!(2024-02-29 0:00 UTC));
        assert_eq!(yesterday.end, datetime!(2024-03-01 0:00 UTC));
    }

    #[test]
    fn year_bounds_cover_whole_year() {
        let window = year_bounds(2024, utc()).unwrap();

        assert_eq!(window.start, datetime!(2024-01-01 0:00 UTC));
        assert_eq!(window.end, datetime!(2025-01-01 0:00 UTC));
    }

    #[test]
    fn date_range_includes_last_day() {
        let window =
            date_range_bounds(date!(2024 - 03 - 01), date!(2024 - 03 - 03), utc()).unwrap();

        assert_eq!(window.start, datetime!(2024-03-01 0:00 UTC));
        assert_eq!(window.end, datetime!(2024-03-04 0:00 UTC));
    }

    #[test]
    fn date_range_rejects_reversed_range() {
        let result = date_range_bounds(date!(2024 - 03 - 03), date!(2024 - 03 - 01), utc());

        assert_eq!(
            result,
            Err(Error::InvalidDateRange {
                first: date!(2024 - 03 - 03),
                last: date!(2024 - 03 - 01),
            })
        );
    }

    #[test]
    fn parses_month_formats() {
        assert_eq!(parse_target_month("2024-06"), Ok(date!(2024 - 06 - 01)));
        assert_eq!(parse_target_month("2024-06-18"), Ok(date!(2024 - 06 - 18)));
        assert_eq!(
            parse_target_month("2024-06-18T10:30:00Z"),
            Ok(date!(2024 - 06 - 18))
        );
    }

    #[test]
    fn rejects_unparseable_month() {
        for text in ["", "June", "2024-13", "2024/06"] {
            assert_eq!(
                parse_target_month(text),
                Err(Error::InvalidMonth(text.to_owned())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn month_key_orders_chronologically() {
        let december = MonthKey::of(date!(2023 - 12 - 25));
        let january = MonthKey::of(date!(2024 - 01 - 02));

        assert!(december < january);
        assert_eq!(january.month, 1);
    }
}

//! The analytic views over an owner's expenses.
//!
//! Every view is computed from grouped queries against an [ExpenseStore],
//! scoped to one owner and bounded by calendar windows in the configured
//! timezone.

mod merge;

use time::Date;

use crate::{
    Error,
    calendar::{
        Window, date_range_bounds, month_bounds, today_bounds, year_bounds, yesterday_bounds,
    },
    clock::{Clock, SystemClock},
    database_id::ExpenseId,
    expense::{ExpenseRecord, NewExpense},
    owner::OwnerId,
    store::{
        AggregateQuery, Bucket, BucketKey, ExpenseStore, Filters, GroupKey, RecordOrder, Reducer,
    },
    timezone::LocalTimezone,
};

/// Total spending for the current month, today and yesterday.
///
/// A window with no expenses is `None` rather than zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodPreview {
    /// Spend so far this calendar month.
    pub current_month: Option<f64>,
    /// Spend today.
    pub today: Option<f64>,
    /// Spend yesterday.
    pub yesterday: Option<f64>,
}

/// A category's average monthly spend next to its spend this month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// The category name.
    pub category: String,
    /// The mean of the category's totals over every month it has expenses in.
    pub monthly_average: Option<f64>,
    /// The category's total for the current month.
    pub current_month_total: Option<f64>,
}

/// A single expense placed on its day of the month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    /// The local day of the month, 1 to 31.
    pub day: u8,
    /// The amount of the expense.
    pub amount: f64,
}

/// The total spend of a category over a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The summed amount.
    pub total: f64,
}

/// The total spend of one month of a year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyTotal {
    /// The month number, 1 for January through 12 for December.
    pub month: u8,
    /// The summed amount.
    pub total: f64,
}

/// Computes analytic views over the expenses in a store.
///
/// The engine holds no mutable state, it is safe to share between threads
/// whenever the store and clock are.
#[derive(Debug, Clone)]
pub struct ExpenseAnalytics<S, C = SystemClock> {
    store: S,
    clock: C,
    timezone: LocalTimezone,
}

impl<S: ExpenseStore, C: Clock> ExpenseAnalytics<S, C> {
    /// Create an engine over `store` that reads the time from `clock` and
    /// computes calendar boundaries in `timezone`.
    pub fn new(store: S, clock: C, timezone: LocalTimezone) -> Self {
        Self {
            store,
            clock,
            timezone,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The timezone calendar boundaries are computed in.
    pub fn timezone(&self) -> LocalTimezone {
        self.timezone
    }

    /// Sum the owner's spending for this month, today and yesterday.
    ///
    /// # Errors
    /// Returns [Error::StoreFailure] if any of the three queries fails.
    pub fn current_period_preview(&self, owner: OwnerId) -> Result<PeriodPreview, Error> {
        let now = self.clock.now();

        let current_month = self.window_total(
            owner,
            month_bounds(self.timezone.local_date(now)?, self.timezone)?,
        )?;
        let today = self.window_total(owner, today_bounds(now, self.timezone)?)?;
        let yesterday = self.window_total(owner, yesterday_bounds(now, self.timezone)?)?;

        Ok(PeriodPreview {
            current_month,
            today,
            yesterday,
        })
    }

    /// Compare each category's average monthly spend with its spend this month.
    ///
    /// The average covers every month the category has expenses in, including
    /// the current one. Categories are sorted by name.
    ///
    /// # Errors
    /// Returns [Error::StoreFailure] if either query fails.
    pub fn category_average_vs_total(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<CategorySummary>, Error> {
        let today = self.timezone.local_date(self.clock.now())?;
        let current_month = month_bounds(today, self.timezone)?;

        let averages = self.aggregate(
            owner,
            AggregateQuery::new(Filters::new(), self.timezone)
                .group(GroupKey::CategoryAndMonth, Reducer::Sum)
                .group(GroupKey::Category, Reducer::Average),
        )?;
        let totals = self.aggregate(
            owner,
            AggregateQuery::new(Filters::new().within(current_month), self.timezone)
                .group(GroupKey::Category, Reducer::Sum),
        )?;

        Ok(merge::join_by_category(averages, totals))
    }

    /// Place each of the owner's expenses in `target_month` on its day of the month.
    ///
    /// Points keep the order the store returns the expenses in, one point per
    /// expense.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::MissingTargetMonth] if no month was given,
    /// - [Error::DateOutOfRange] if the month boundaries cannot be represented,
    /// - [Error::StoreFailure] if the query fails.
    pub fn daily_series(
        &self,
        owner: OwnerId,
        target_month: Option<Date>,
    ) -> Result<Vec<DailyPoint>, Error> {
        let target_month = target_month.ok_or(Error::MissingTargetMonth)?;
        let window = month_bounds(target_month, self.timezone)?;

        let records = self.records(owner, Filters::new().within(window), RecordOrder::Stored)?;

        records
            .into_iter()
            .map(|record| -> Result<DailyPoint, Error> {
                Ok(DailyPoint {
                    day: self.timezone.local_date(record.incurred_on)?.day(),
                    amount: record.amount,
                })
            })
            .collect()
    }

    /// Sum the owner's spending per category from `first` to `last`, both days included.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidDateRange] if `last` is before `first`,
    /// - [Error::StoreFailure] if the query fails.
    pub fn category_totals(
        &self,
        owner: OwnerId,
        first: Date,
        last: Date,
    ) -> Result<Vec<CategoryTotal>, Error> {
        let window = date_range_bounds(first, last, self.timezone)?;

        let buckets = self.aggregate(
            owner,
            AggregateQuery::new(Filters::new().within(window), self.timezone)
                .group(GroupKey::Category, Reducer::Sum),
        )?;

        Ok(buckets
            .into_iter()
            .filter_map(|bucket| match bucket.key {
                BucketKey::Category(category) => Some(CategoryTotal {
                    category,
                    total: bucket.value,
                }),
                _ => None,
            })
            .collect())
    }

    /// Sum the owner's spending for each month of `year` that has expenses.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::MissingYear] if no year was given,
    /// - [Error::DateOutOfRange] if the year cannot be represented,
    /// - [Error::StoreFailure] if the query fails.
    pub fn yearly_totals(
        &self,
        owner: OwnerId,
        year: Option<i32>,
    ) -> Result<Vec<MonthlyTotal>, Error> {
        let year = year.ok_or(Error::MissingYear)?;
        let window = year_bounds(year, self.timezone)?;

        let buckets = self.aggregate(
            owner,
            AggregateQuery::new(Filters::new().within(window), self.timezone)
                .group(GroupKey::Month, Reducer::Sum),
        )?;

        Ok(buckets
            .into_iter()
            .filter_map(|bucket| match bucket.key {
                BucketKey::Month(month) => Some(MonthlyTotal {
                    month: month.month,
                    total: bucket.value,
                }),
                _ => None,
            })
            .collect())
    }

    /// The owner's expenses from `first` to `last`, both days included, oldest first.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidDateRange] if `last` is before `first`,
    /// - [Error::StoreFailure] if the query fails.
    pub fn list_expenses(
        &self,
        owner: OwnerId,
        first: Date,
        last: Date,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        let window = date_range_bounds(first, last, self.timezone)?;

        self.records(
            owner,
            Filters::new().within(window),
            RecordOrder::IncurredAscending,
        )
    }

    /// Record a new expense for `owner`.
    ///
    /// # Errors
    /// Returns an invariant error if the expense is invalid, or the store's
    /// error if it could not be saved.
    pub fn record_expense(
        &self,
        owner: OwnerId,
        expense: NewExpense,
    ) -> Result<ExpenseRecord, Error> {
        let record = self
            .store
            .create(owner, expense, self.clock.now())
            .inspect_err(|error| {
                tracing::warn!("owner {owner} could not record expense: {error}")
            })?;
        tracing::info!("owner {owner} recorded expense {}", record.id);

        Ok(record)
    }

    /// Replace the fields of one of `owner`'s expenses.
    ///
    /// # Errors
    /// Returns [Error::NotFound] or [Error::Forbidden] if the expense is
    /// missing or belongs to someone else, an invariant error if the new
    /// fields are invalid, or the store's error if it could not be saved.
    pub fn update_expense(
        &self,
        owner: OwnerId,
        id: ExpenseId,
        expense: NewExpense,
    ) -> Result<ExpenseRecord, Error> {
        let record = self
            .store
            .update(owner, id, expense, self.clock.now())
            .inspect_err(|error| {
                tracing::warn!("owner {owner} could not update expense {id}: {error}")
            })?;
        tracing::info!("owner {owner} updated expense {id}");

        Ok(record)
    }

    /// Delete one of `owner`'s expenses, returning it.
    ///
    /// # Errors
    /// Returns [Error::NotFound] or [Error::Forbidden] if the expense is
    /// missing or belongs to someone else.
    pub fn remove_expense(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let record = self
            .store
            .delete(owner, id)
            .inspect_err(|error| {
                tracing::warn!("owner {owner} could not delete expense {id}: {error}")
            })?;
        tracing::info!("owner {owner} deleted expense {id}");

        Ok(record)
    }

    /// The owner's total for `window`, `None` if there are no expenses in it.
    fn window_total(&self, owner: OwnerId, window: Window) -> Result<Option<f64>, Error> {
        let buckets = self.aggregate(
            owner,
            AggregateQuery::new(Filters::new().within(window), self.timezone)
                .group(GroupKey::All, Reducer::Sum),
        )?;

        Ok(buckets.first().map(|bucket| bucket.value))
    }

    fn aggregate(&self, owner: OwnerId, query: AggregateQuery) -> Result<Vec<Bucket>, Error> {
        tracing::debug!(
            "aggregating expenses of owner {owner} with {} filters and stages {:?}",
            query.filters.clauses().len(),
            query.stages
        );

        self.store
            .aggregate(owner, &query)
            .inspect_err(|error| {
                tracing::error!("could not aggregate expenses of owner {owner}: {error}")
            })
            .map_err(|error| Error::StoreFailure(error.to_string()))
    }

    fn records(
        &self,
        owner: OwnerId,
        filters: Filters,
        order: RecordOrder,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        tracing::debug!(
            "querying expenses of owner {owner} with {} filters in {order:?} order",
            filters.clauses().len()
        );

        self.store
            .records(owner, &filters, order)
            .inspect_err(|error| {
                tracing::error!("could not query expenses of owner {owner}: {error}")
            })
            .map_err(|error| Error::StoreFailure(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use time::{
        OffsetDateTime,
        macros::{date, datetime},
    };

    use super::{
        CategorySummary, CategoryTotal, DailyPoint, ExpenseAnalytics, MonthlyTotal, PeriodPreview,
    };
    use crate::{
        Error,
        clock::FixedClock,
        database_id::ExpenseId,
        expense::{ExpenseRecord, NewExpense},
        owner::OwnerId,
        store::{AggregateQuery, Bucket, ExpenseStore, Filters, MemoryExpenseStore, RecordOrder},
        test_utils::{auckland, utc},
        timezone::LocalTimezone,
    };

    const OWNER: OwnerId = OwnerId::new(1);
    const STRANGER: OwnerId = OwnerId::new(2);
    const NOW: OffsetDateTime = datetime!(2024-06-15 10:00 UTC);

    type TestAnalytics = ExpenseAnalytics<MemoryExpenseStore, FixedClock>;

    fn get_analytics(timezone: LocalTimezone) -> TestAnalytics {
        ExpenseAnalytics::new(MemoryExpenseStore::new(), FixedClock(NOW), timezone)
    }

    fn add(
        analytics: &TestAnalytics,
        owner: OwnerId,
        category: &str,
        amount: f64,
        incurred_on: OffsetDateTime,
    ) -> ExpenseRecord {
        analytics
            .record_expense(
                owner,
                ExpenseRecord::build("Test", amount, category).incurred_on(incurred_on),
            )
            .unwrap()
    }

    #[test]
    fn preview_without_expenses_is_empty() {
        let analytics = get_analytics(utc());

        let got = analytics.current_period_preview(OWNER).unwrap();

        assert_eq!(
            got,
            PeriodPreview {
                current_month: None,
                today: None,
                yesterday: None,
            }
        );
    }

    #[test]
    fn preview_sums_each_window() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Food", 1.0, datetime!(2024-05-31 23:59:59 UTC));
        add(&analytics, OWNER, "Food", 2.0, datetime!(2024-06-01 0:00 UTC));
        add(&analytics, OWNER, "Food", 4.0, datetime!(2024-06-14 12:00 UTC));
        add(&analytics, OWNER, "Rent", 8.0, datetime!(2024-06-15 0:00 UTC));
        add(&analytics, OWNER, "Food", 16.0, datetime!(2024-06-15 23:59:59 UTC));
        add(&analytics, OWNER, "Food", 32.0, datetime!(2024-07-01 0:00 UTC));
        add(&analytics, STRANGER, "Food", 64.0, datetime!(2024-06-15 9:00 UTC));

        let got = analytics.current_period_preview(OWNER).unwrap();

        assert_eq!(
            got,
            PeriodPreview {
                current_month: Some(30.0),
                today: Some(24.0),
                yesterday: Some(4.0),
            }
        );
    }

    #[test]
    fn preview_uses_local_calendar() {
        // 10:00 UTC on the 15th of June is 22:00 on the 15th in Auckland (UTC+12).
        let analytics = get_analytics(auckland());
        add(&analytics, OWNER, "Food", 1.0, datetime!(2024-06-14 11:00 UTC));
        add(&analytics, OWNER, "Food", 2.0, datetime!(2024-06-14 13:00 UTC));
        add(&analytics, OWNER, "Food", 4.0, datetime!(2024-05-31 12:30 UTC));

        let got = analytics.current_period_preview(OWNER).unwrap();

        assert_eq!(
            got,
            PeriodPreview {
                current_month: Some(7.0),
                today: Some(2.0),
                yesterday: Some(1.0),
            }
        );
    }

    #[test]
    fn category_average_vs_total_example() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "food", 10.0, datetime!(2024-05-01 12:00 UTC));
        add(&analytics, OWNER, "food", 20.0, datetime!(2024-06-01 12:00 UTC));

        let got = analytics.category_average_vs_total(OWNER).unwrap();

        assert_eq!(
            got,
            vec![CategorySummary {
                category: "food".to_owned(),
                monthly_average: Some(15.0),
                current_month_total: Some(20.0),
            }]
        );
    }

    #[test]
    fn category_without_spend_this_month_has_no_total() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Travel", 300.0, datetime!(2024-01-10 12:00 UTC));
        add(&analytics, OWNER, "Travel", 100.0, datetime!(2024-03-10 12:00 UTC));
        add(&analytics, OWNER, "Food", 12.0, datetime!(2024-06-02 12:00 UTC));

        let got = analytics.category_average_vs_total(OWNER).unwrap();

        assert_eq!(
            got,
            vec![
                CategorySummary {
                    category: "Food".to_owned(),
                    monthly_average: Some(12.0),
                    current_month_total: Some(12.0),
                },
                CategorySummary {
                    category: "Travel".to_owned(),
                    monthly_average: Some(200.0),
                    current_month_total: None,
                },
            ]
        );
    }

    #[test]
    fn category_totals_add_up_to_month_preview() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Food", 12.5, datetime!(2024-06-02 12:00 UTC));
        add(&analytics, OWNER, "Food", 7.25, datetime!(2024-06-09 12:00 UTC));
        add(&analytics, OWNER, "Rent", 400.0, datetime!(2024-06-01 12:00 UTC));
        add(&analytics, OWNER, "Fun", 60.0, datetime!(2024-04-01 12:00 UTC));

        let summaries = analytics.category_average_vs_total(OWNER).unwrap();
        let preview = analytics.current_period_preview(OWNER).unwrap();

        let total: f64 = summaries
            .iter()
            .filter_map(|summary| summary.current_month_total)
            .sum();
        assert_eq!(Some(total), preview.current_month);
    }

    #[test]
    fn single_month_category_average_equals_total() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Food", 3.0, datetime!(2024-06-02 12:00 UTC));
        add(&analytics, OWNER, "Food", 5.0, datetime!(2024-06-03 12:00 UTC));

        let got = analytics.category_average_vs_total(OWNER).unwrap();

        assert_eq!(got[0].monthly_average, got[0].current_month_total);
        assert_eq!(got[0].current_month_total, Some(8.0));
    }

    #[test]
    fn category_summaries_ignore_other_owners() {
        let analytics = get_analytics(utc());
        add(&analytics, STRANGER, "Food", 3.0, datetime!(2024-06-02 12:00 UTC));

        let got = analytics.category_average_vs_total(OWNER).unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn daily_series_requires_month() {
        let analytics = get_analytics(utc());

        let result = analytics.daily_series(OWNER, None);

        assert_eq!(result, Err(Error::MissingTargetMonth));
    }

    #[test]
    fn daily_series_has_one_point_per_expense_in_record_order() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Food", 5.0, datetime!(2024-05-20 12:00 UTC));
        add(&analytics, OWNER, "Food", 3.0, datetime!(2024-05-02 12:00 UTC));
        add(&analytics, OWNER, "Food", 4.0, datetime!(2024-05-20 18:00 UTC));
        add(&analytics, OWNER, "Food", 9.0, datetime!(2024-06-01 0:00 UTC));
        add(&analytics, OWNER, "Food", 9.0, datetime!(2024-04-30 23:59:59 UTC));
        add(&analytics, STRANGER, "Food", 9.0, datetime!(2024-05-20 12:00 UTC));

        let got = analytics
            .daily_series(OWNER, Some(date!(2024 - 05 - 01)))
            .unwrap();

        assert_eq!(
            got,
            vec![
                DailyPoint { day: 20, amount: 5.0 },
                DailyPoint { day: 2, amount: 3.0 },
                DailyPoint { day: 20, amount: 4.0 },
            ]
        );
    }

    #[test]
    fn daily_series_uses_local_day() {
        let analytics = get_analytics(auckland());
        // 12:30 UTC on the 31st of May is the 1st of June in Auckland.
        add(&analytics, OWNER, "Food", 5.0, datetime!(2024-05-31 12:30 UTC));

        let june = analytics
            .daily_series(OWNER, Some(date!(2024 - 06 - 10)))
            .unwrap();
        let may = analytics
            .daily_series(OWNER, Some(date!(2024 - 05 - 10)))
            .unwrap();

        assert_eq!(june, vec![DailyPoint { day: 1, amount: 5.0 }]);
        assert!(may.is_empty());
    }

    #[test]
    fn category_totals_cover_inclusive_range() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Rent", 400.0, datetime!(2024-03-01 0:00 UTC));
        add(&analytics, OWNER, "Food", 10.0, datetime!(2024-03-05 12:00 UTC));
        add(&analytics, OWNER, "Food", 15.0, datetime!(2024-03-10 23:59:59 UTC));
        add(&analytics, OWNER, "Food", 99.0, datetime!(2024-03-11 0:00 UTC));
        add(&analytics, STRANGER, "Food", 1000.0, datetime!(2024-03-05 12:00 UTC));
        add(&analytics, STRANGER, "Fun", 1000.0, datetime!(2024-03-05 12:00 UTC));

        let got = analytics
            .category_totals(OWNER, date!(2024 - 03 - 01), date!(2024 - 03 - 10))
            .unwrap();

        assert_eq!(
            got,
            vec![
                CategoryTotal {
                    category: "Food".to_owned(),
                    total: 25.0
                },
                CategoryTotal {
                    category: "Rent".to_owned(),
                    total: 400.0
                },
            ]
        );
    }

    #[test]
    fn category_totals_reject_reversed_range() {
        let analytics = get_analytics(utc());

        let result =
            analytics.category_totals(OWNER, date!(2024 - 03 - 10), date!(2024 - 03 - 01));

        assert_eq!(
            result,
            Err(Error::InvalidDateRange {
                first: date!(2024 - 03 - 10),
                last: date!(2024 - 03 - 01),
            })
        );
    }

    #[test]
    fn yearly_totals_require_year() {
        let analytics = get_analytics(utc());

        assert_eq!(analytics.yearly_totals(OWNER, None), Err(Error::MissingYear));
    }

    #[test]
    fn yearly_totals_sum_each_month() {
        let analytics = get_analytics(utc());
        add(&analytics, OWNER, "Food", 10.0, datetime!(2023-12-31 23:00 UTC));
        add(&analytics, OWNER, "Food", 1.0, datetime!(2024-01-01 0:00 UTC));
        add(&analytics, OWNER, "Rent", 2.0, datetime!(2024-01-20 0:00 UTC));
        add(&analytics, OWNER, "Food", 4.0, datetime!(2024-11-03 0:00 UTC));
        add(&analytics, STRANGER, "Food", 1000.0, datetime!(2024-01-15 0:00 UTC));
        add(&analytics, STRANGER, "Food", 1000.0, datetime!(2024-05-15 0:00 UTC));

        let got = analytics.yearly_totals(OWNER, Some(2024)).unwrap();

        assert_eq!(
            got,
            vec![
                MonthlyTotal {
                    month: 1,
                    total: 3.0
                },
                MonthlyTotal {
                    month: 11,
                    total: 4.0
                },
            ]
        );
    }

    #[test]
    fn list_expenses_are_oldest_first() {
        let analytics = get_analytics(utc());
        let later = add(&analytics, OWNER, "Food", 1.0, datetime!(2024-06-03 0:00 UTC));
        let earlier = add(&analytics, OWNER, "Food", 2.0, datetime!(2024-06-01 0:00 UTC));
        add(&analytics, OWNER, "Food", 3.0, datetime!(2024-06-04 0:00 UTC));
        add(&analytics, STRANGER, "Food", 4.0, datetime!(2024-06-02 0:00 UTC));

        let got = analytics
            .list_expenses(OWNER, date!(2024 - 06 - 01), date!(2024 - 06 - 03))
            .unwrap();

        assert_eq!(got, vec![earlier, later]);
    }

    #[test]
    fn mutations_are_owner_checked() {
        let analytics = get_analytics(utc());
        let expense = add(&analytics, OWNER, "Food", 1.0, datetime!(2024-06-03 0:00 UTC));

        assert_eq!(
            analytics.update_expense(
                STRANGER,
                expense.id,
                ExpenseRecord::build("Mine", 1.0, "Food")
            ),
            Err(Error::Forbidden)
        );
        assert_eq!(
            analytics.remove_expense(STRANGER, expense.id),
            Err(Error::Forbidden)
        );

        let updated = analytics
            .update_expense(
                OWNER,
                expense.id,
                ExpenseRecord::build("Groceries", 2.0, "Food"),
            )
            .unwrap();
        assert_eq!(updated.amount, 2.0);
        assert_eq!(updated.updated_at, Some(NOW));
        assert_eq!(analytics.remove_expense(OWNER, expense.id), Ok(updated));
        assert_eq!(
            analytics.remove_expense(OWNER, expense.id),
            Err(Error::NotFound)
        );
    }

    struct BrokenStore;

    impl ExpenseStore for BrokenStore {
        fn create(
            &self,
            _owner: OwnerId,
            _expense: NewExpense,
            _now: OffsetDateTime,
        ) -> Result<ExpenseRecord, Error> {
            Err(Error::DatabaseLockError)
        }

        fn get(&self, _owner: OwnerId, _id: ExpenseId) -> Result<ExpenseRecord, Error> {
            Err(Error::DatabaseLockError)
        }

        fn update(
            &self,
            _owner: OwnerId,
            _id: ExpenseId,
            _expense: NewExpense,
            _now: OffsetDateTime,
        ) -> Result<ExpenseRecord, Error> {
            Err(Error::DatabaseLockError)
        }

        fn delete(&self, _owner: OwnerId, _id: ExpenseId) -> Result<ExpenseRecord, Error> {
            Err(Error::DatabaseLockError)
        }

        fn records(
            &self,
            _owner: OwnerId,
            _filters: &Filters,
            _order: RecordOrder,
        ) -> Result<Vec<ExpenseRecord>, Error> {
            Err(Error::DatabaseLockError)
        }

        fn aggregate(
            &self,
            _owner: OwnerId,
            _query: &AggregateQuery,
        ) -> Result<Vec<Bucket>, Error> {
            Err(Error::DatabaseLockError)
        }
    }

    fn broken_analytics() -> ExpenseAnalytics<BrokenStore, FixedClock> {
        ExpenseAnalytics::new(BrokenStore, FixedClock(NOW), utc())
    }

    #[test]
    fn store_failures_are_wrapped() {
        let analytics = broken_analytics();
        assert_eq!(
            analytics.current_period_preview(OWNER),
            Err(Error::StoreFailure(Error::DatabaseLockError.to_string()))
        );
        assert_eq!(
            analytics.category_average_vs_total(OWNER),
            Err(Error::StoreFailure(Error::DatabaseLockError.to_string()))
        );
        assert_eq!(
            analytics.daily_series(OWNER, Some(date!(2024 - 06 - 01))),
            Err(Error::StoreFailure(Error::DatabaseLockError.to_string()))
        );
    }

    #[test]
    fn input_is_checked_before_the_store() {
        let analytics = broken_analytics();

        assert_eq!(
            analytics.daily_series(OWNER, None),
            Err(Error::MissingTargetMonth)
        );
        assert_eq!(
            analytics.yearly_totals(OWNER, None),
            Err(Error::MissingYear)
        );
    }

    #[test]
    fn crud_errors_pass_through() {
        let analytics = broken_analytics();

        assert_eq!(
            analytics.record_expense(OWNER, ExpenseRecord::build("Lunch", 1.0, "Food")),
            Err(Error::DatabaseLockError)
        );
    }
}

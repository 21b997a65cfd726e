//! Grouping and reducing expense amounts into buckets.
//!
//! Shared by every store: a store narrows the records down with its own
//! filtering and hands the survivors to [aggregate].

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::{
    Error,
    calendar::MonthKey,
    store::{AggregateQuery, Bucket, BucketKey, GroupKey, GroupStage, Reducer},
    timezone::LocalTimezone,
};

/// The fields of an expense that grouping looks at.
#[derive(Debug, Clone, Copy)]
pub(super) struct GroupInput<'a> {
    pub category: &'a str,
    pub incurred_on: OffsetDateTime,
    pub amount: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn reduce(&self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Count => self.count as f64,
            // Accumulators are only created by a push, so count is never zero.
            Reducer::Average => self.sum / self.count as f64,
        }
    }
}

/// Run every stage of `query` over `rows`.
///
/// Amounts are added up in the order of `rows`. Every store feeds its rows
/// in creation order, so the same records always reduce to the same values.
///
/// # Errors
/// Returns:
/// - [Error::InvalidGrouping] if the query has no stages or a later stage's
///   key cannot be derived from the previous stage's keys,
/// - [Error::DateOutOfRange] if a record's local date is not representable.
pub(super) fn aggregate<'a>(
    rows: impl IntoIterator<Item = GroupInput<'a>>,
    query: &AggregateQuery,
) -> Result<Vec<Bucket>, Error> {
    let Some((first, rest)) = query.stages.split_first() else {
        return Err(Error::InvalidGrouping(
            "an aggregate query needs at least one group stage".to_owned(),
        ));
    };

    let mut groups: BTreeMap<BucketKey, Accumulator> = BTreeMap::new();

    for row in rows {
        groups
            .entry(record_key(first.key, &row, query.timezone)?)
            .or_default()
            .push(row.amount);
    }

    regroup(finish(groups, first.reducer), rest)
}

/// Run `stages` over buckets produced by an earlier stage.
///
/// # Errors
/// Returns [Error::InvalidGrouping] if a stage's key cannot be derived from
/// the keys of the stage before it.
fn regroup(
    mut buckets: Vec<Bucket>,
    stages: &[GroupStage],
) -> Result<Vec<Bucket>, Error> {
    for stage in stages {
        let mut groups: BTreeMap<BucketKey, Accumulator> = BTreeMap::new();

        for bucket in buckets {
            let key = bucket.key.project(stage.key).ok_or_else(|| {
                Error::InvalidGrouping(format!(
                    "cannot group the bucket \"{}\" by {:?}",
                    bucket.key, stage.key
                ))
            })?;

            groups.entry(key).or_default().push(bucket.value);
        }

        buckets = finish(groups, stage.reducer);
    }

    Ok(buckets)
}

fn record_key(
    key: GroupKey,
    row: &GroupInput<'_>,
    timezone: LocalTimezone,
) -> Result<BucketKey, Error> {
    let bucket_key = match key {
        GroupKey::All => BucketKey::All,
        GroupKey::Category => BucketKey::Category(row.category.to_owned()),
        GroupKey::Month => BucketKey::Month(MonthKey::of(timezone.local_date(row.incurred_on)?)),
        GroupKey::DayOfMonth => {
            BucketKey::DayOfMonth(timezone.local_date(row.incurred_on)?.day())
        }
        GroupKey::CategoryAndMonth => BucketKey::CategoryAndMonth(
            row.category.to_owned(),
            MonthKey::of(timezone.local_date(row.incurred_on)?),
        ),
    };

    Ok(bucket_key)
}

fn finish(groups: BTreeMap<BucketKey, Accumulator>, reducer: Reducer) -> Vec<Bucket> {
    groups
        .into_iter()
        .map(|(key, accumulator)| Bucket {
            value: accumulator.reduce(reducer),
            key,
        })
        .collect()
}

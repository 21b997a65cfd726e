//! Joins per-category averages with per-category totals.

use std::collections::BTreeMap;

use crate::{
    analytics::CategorySummary,
    store::{Bucket, BucketKey},
};

/// Outer join category `averages` and category `totals` on the category name.
///
/// Every category from either side appears once, with `None` for the side it
/// is missing from. The result is sorted by category name. Buckets that are
/// not keyed by category are ignored.
pub(super) fn join_by_category(averages: Vec<Bucket>, totals: Vec<Bucket>) -> Vec<CategorySummary> {
    let mut joined: BTreeMap<String, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for (category, average) in category_values(averages) {
        joined.entry(category).or_default().0 = Some(average);
    }

    for (category, total) in category_values(totals) {
        joined.entry(category).or_default().1 = Some(total);
    }

    joined
        .into_iter()
        .map(|(category, (monthly_average, current_month_total))| CategorySummary {
            category,
            monthly_average,
            current_month_total,
        })
        .collect()
}

fn category_values(buckets: Vec<Bucket>) -> impl Iterator<Item = (String, f64)> {
    buckets.into_iter().filter_map(|bucket| match bucket.key {
        BucketKey::Category(category) => Some((category, bucket.value)),
        key => {
            tracing::warn!("ignoring bucket \"{key}\" while joining categories");
            None
        }
    })
}

//! Shapes analytic results into fixed-key views for display.
//!
//! Every field of a view is always serialized, absent values become `null`.

use serde::{Deserialize, Serialize};

use crate::analytics::{CategorySummary, CategoryTotal, DailyPoint, MonthlyTotal, PeriodPreview};

/// Spending this month, today and yesterday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodPreviewView {
    /// Spend so far this month.
    pub month: Option<f64>,
    /// Spend today.
    pub today: Option<f64>,
    /// Spend yesterday.
    pub yesterday: Option<f64>,
}

impl From<PeriodPreview> for PeriodPreviewView {
    fn from(preview: PeriodPreview) -> Self {
        Self {
            month: preview.current_month,
            today: preview.today,
            yesterday: preview.yesterday,
        }
    }
}

/// One row of the category average versus total table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummaryView {
    /// The category name.
    pub category: String,
    /// The average monthly spend.
    pub average: Option<f64>,
    /// The spend this month.
    pub total: Option<f64>,
}

/// A point on a chart with a numeric x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    /// A day of the month or a month of the year.
    pub x: u8,
    /// The amount.
    pub y: f64,
}

/// A point on a chart with categories along the x-axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPoint {
    /// The category name.
    pub x: String,
    /// The amount.
    pub y: f64,
}

/// Rename the fields of each summary for display.
pub fn category_summary_views(summaries: Vec<CategorySummary>) -> Vec<CategorySummaryView> {
    summaries
        .into_iter()
        .map(|summary| CategorySummaryView {
            category: summary.category,
            average: summary.monthly_average,
            total: summary.current_month_total,
        })
        .collect()
}

/// Plot the daily series with the day of the month on the x-axis.
pub fn daily_plot_points(series: &[DailyPoint]) -> Vec<PlotPoint> {
    series
        .iter()
        .map(|point| PlotPoint {
            x: point.day,
            y: point.amount,
        })
        .collect()
}

/// Plot the monthly totals with the month number on the x-axis.
pub fn monthly_total_points(totals: &[MonthlyTotal]) -> Vec<PlotPoint> {
    totals
        .iter()
        .map(|total| PlotPoint {
            x: total.month,
            y: total.total,
        })
        .collect()
}

/// Plot the category totals with the category on the x-axis.
pub fn category_total_points(totals: Vec<CategoryTotal>) -> Vec<CategoryPoint> {
    totals
        .into_iter()
        .map(|total| CategoryPoint {
            x: total.category,
            y: total.total,
        })
        .collect()
}

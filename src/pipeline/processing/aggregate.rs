use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::constants::DEFAULT_DELIVERY_DAYS_BINS;
use crate::domain::{AnalyticalRow, DeliveryStatus};
use crate::pipeline::processing::join::AnalyticalView;

/// Closed calendar-date interval over the delivery date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn from_bounds(bounds: (NaiveDate, NaiveDate)) -> Self {
        Self::new(bounds.0, bounds.1)
    }

    /// Both ends are inclusive, at day granularity
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        self.start <= date && date <= self.end
    }

    /// Whether this range lies inside `bounds`, as the date picker requires
    pub fn is_within(&self, bounds: (NaiveDate, NaiveDate)) -> bool {
        bounds.0 <= self.start && self.end <= bounds.1 && self.start <= self.end
    }
}

/// Calendar month bucket, rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(timestamp: NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: YearMonth,
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreCount {
    pub review_score: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagScoreCount {
    pub status_flag: u8,
    pub review_score: u8,
    pub count: usize,
}

/// Half-open `[lower, upper)` bin; the last bin also includes `upper`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

/// Box-plot inputs; quartiles use linear interpolation between order statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl FiveNumberSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        Some(Self {
            count: n,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
        })
    }
}

// `sorted` must be non-empty and ascending
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagScoreSummary {
    pub status_flag: u8,
    pub review_score: FiveNumberSummary,
}

/// Everything the presentation layer needs for one date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Applied interval; `None` when the view was summarized unfiltered
    pub range: Option<DateRange>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub status_by_month: Vec<MonthlyCount>,
    pub payment_type_by_month: Vec<MonthlyCount>,
    pub status_counts: Vec<CategoryCount>,
    pub flag_vs_score: Vec<FlagScoreCount>,
    pub review_score_counts: Vec<ScoreCount>,
    pub payment_type_counts: Vec<CategoryCount>,
    pub delivery_days_histogram: Vec<HistogramBin>,
    pub delivery_days_summary: Option<FiveNumberSummary>,
    pub review_score_by_flag: Vec<FlagScoreSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<AnalyticalRow>>,
}

/// Rows whose delivery date falls inside `range`, in view order
pub fn filter_rows<'a>(view: &'a AnalyticalView, range: &DateRange) -> Vec<&'a AnalyticalRow> {
    view.rows()
        .iter()
        .filter(|row| range.contains(row.delivered_at()))
        .collect()
}

fn monthly<'a, K, F>(rows: &[&'a AnalyticalRow], key: F) -> Vec<MonthlyCount>
where
    K: Ord + ToString,
    F: Fn(&'a AnalyticalRow) -> Option<K>,
{
    let mut groups: BTreeMap<(YearMonth, K), usize> = BTreeMap::new();
    for row in rows.iter().copied() {
        if let Some(category) = key(row) {
            *groups.entry((YearMonth::of(row.delivered_at()), category)).or_insert(0) += 1;
        }
    }
    groups
        .into_iter()
        .map(|((month, category), count)| MonthlyCount {
            month,
            category: category.to_string(),
            count,
        })
        .collect()
}

fn histogram(values: &[i64], edges: &[i64]) -> Vec<HistogramBin> {
    let mut bins: Vec<HistogramBin> = edges
        .windows(2)
        .map(|w| HistogramBin {
            lower: w[0],
            upper: w[1],
            count: 0,
        })
        .collect();
    let last = bins.len().saturating_sub(1);
    for value in values {
        if let Some(bin) = bins.iter_mut().enumerate().find_map(|(i, bin)| {
            let inside = bin.lower <= *value && (*value < bin.upper || (i == last && *value == bin.upper));
            inside.then_some(bin)
        }) {
            bin.count += 1;
        }
    }
    bins
}

/// Groups filtered rows into the dashboard's count and distribution tables
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// Ascending histogram edges for delivery duration, at least two
    pub delivery_days_bins: Vec<i64>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            delivery_days_bins: DEFAULT_DELIVERY_DAYS_BINS.to_vec(),
        }
    }
}

impl Aggregator {
    pub fn new(delivery_days_bins: Vec<i64>) -> Self {
        Self { delivery_days_bins }
    }

    /// Aggregate the rows inside `range`, or the whole view when `range` is `None`
    pub fn summarize(&self, view: &AnalyticalView, range: Option<DateRange>, include_rows: bool) -> DashboardSummary {
        let rows: Vec<&AnalyticalRow> = match &range {
            Some(range) => filter_rows(view, range),
            None => view.rows().iter().collect(),
        };
        debug!(total = view.len(), selected = rows.len(), ?range, "Filtered analytical view");

        let status_by_month = monthly(&rows, |row| Some(row.delivery_status().label()));
        let payment_type_by_month = monthly(&rows, |row| row.payment_type());

        let mut status_counts: BTreeMap<DeliveryStatus, usize> = BTreeMap::new();
        let mut flag_vs_score: BTreeMap<(u8, u8), usize> = BTreeMap::new();
        let mut score_counts: BTreeMap<u8, usize> = BTreeMap::new();
        let mut payment_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut scores_by_flag: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
        let mut delivery_days = Vec::with_capacity(rows.len());

        for row in rows.iter().copied() {
            let score = row.review_score().value();
            *status_counts.entry(row.delivery_status()).or_insert(0) += 1;
            *flag_vs_score.entry((row.status_flag, score)).or_insert(0) += 1;
            *score_counts.entry(score).or_insert(0) += 1;
            if let Some(payment_type) = row.payment_type() {
                *payment_counts.entry(payment_type).or_insert(0) += 1;
            }
            scores_by_flag.entry(row.status_flag).or_default().push(score as f64);
            delivery_days.push(row.order.delivery_days);
        }

        let days_as_f64: Vec<f64> = delivery_days.iter().map(|d| *d as f64).collect();

        DashboardSummary {
            range,
            total_rows: view.len(),
            filtered_rows: rows.len(),
            status_by_month,
            payment_type_by_month,
            status_counts: status_counts
                .into_iter()
                .map(|(status, count)| CategoryCount {
                    category: status.label().to_string(),
                    count,
                })
                .collect(),
            flag_vs_score: flag_vs_score
                .into_iter()
                .map(|((status_flag, review_score), count)| FlagScoreCount {
                    status_flag,
                    review_score,
                    count,
                })
                .collect(),
            review_score_counts: score_counts
                .into_iter()
                .map(|(review_score, count)| ScoreCount { review_score, count })
                .collect(),
            payment_type_counts: payment_counts
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category: category.to_string(),
                    count,
                })
                .collect(),
            delivery_days_histogram: histogram(&delivery_days, &self.delivery_days_bins),
            delivery_days_summary: FiveNumberSummary::from_values(&days_as_f64),
            review_score_by_flag: scores_by_flag
                .into_iter()
                .filter_map(|(status_flag, scores)| {
                    FiveNumberSummary::from_values(&scores).map(|review_score| FlagScoreSummary {
                        status_flag,
                        review_score,
                    })
                })
                .collect(),
            rows: include_rows.then(|| rows.into_iter().cloned().collect()),
        }
    }
}

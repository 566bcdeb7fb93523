//! Trend and anomaly analysis over daily cost series
//!
//! Moving averages use trailing observation windows (the point itself plus
//! up to `window - 1` prior points); series are sparse and never
//! zero-filled, so windows count observations, not calendar days.
//! Anomaly detection computes each group's z-scores against that group's
//! own mean and sample standard deviation, never a global one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::aggregator::DailyCost;
use crate::types::NormalizedDataset;

/// One point of a trend series: daily cost plus both moving averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub cost: f64,
    pub ma_short: f64,
    pub ma_long: f64,
}

/// A per-group trend series ("total" for the overall series)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub key: String,
    pub points: Vec<TrendPoint>,
}

/// One analyzed observation with its anomaly flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub key: String,
    pub date: NaiveDate,
    pub cost: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

/// Trailing moving average with the given window size.
///
/// Point `i` averages `values[i + 1 - window ..= i]`; leading points with
/// insufficient history average whatever prefix exists, so every input
/// point gets a defined output value. A window of 0 saturates to 1.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut result = Vec::with_capacity(values.len());
    let mut window_sum = 0.0;

    for i in 0..values.len() {
        window_sum += values[i];
        if i >= window {
            window_sum -= values[i - window];
        }
        let len = (i + 1).min(window);
        result.push(window_sum / len as f64);
    }
    result
}

/// Build a trend series from an ascending daily cost series.
pub fn trend_series(
    key: &str,
    daily: &[DailyCost],
    short_window: usize,
    long_window: usize,
) -> TrendSeries {
    let costs: Vec<f64> = daily.iter().map(|d| d.total_cost).collect();
    let short = moving_average(&costs, short_window);
    let long = moving_average(&costs, long_window);

    let points = daily
        .iter()
        .zip(short)
        .zip(long)
        .map(|((day, ma_short), ma_long)| TrendPoint {
            date: day.date,
            cost: day.total_cost,
            ma_short,
            ma_long,
        })
        .collect();

    TrendSeries {
        key: key.to_string(),
        points,
    }
}

/// Per-service daily charge series, sorted by service then date.
pub fn service_daily_series(data: &NormalizedDataset) -> Vec<(String, Vec<DailyCost>)> {
    let mut groups: HashMap<&str, HashMap<NaiveDate, (f64, u64)>> = HashMap::new();
    for record in data.records() {
        if !record.line_item_type.is_charge() {
            continue;
        }
        let entry = groups
            .entry(record.service.as_str())
            .or_default()
            .entry(record.usage_date)
            .or_insert((0.0, 0));
        entry.0 += record.cost;
        entry.1 += 1;
    }

    let mut result: Vec<(String, Vec<DailyCost>)> = groups
        .into_iter()
        .map(|(service, days)| {
            let mut series: Vec<DailyCost> = days
                .into_iter()
                .map(|(date, (total_cost, record_count))| DailyCost {
                    date,
                    total_cost,
                    record_count,
                })
                .collect();
            series.sort_by_key(|d| d.date);
            (service.to_string(), series)
        })
        .collect();
    result.sort_by(|a, b| a.0.cmp(&b.0));
    result
}

/// Sample (n−1) mean and standard deviation
fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

/// Flag statistical outliers per group.
///
/// Groups with fewer than `min_observations` points lack a statistical
/// basis and are skipped entirely (absent from output, not flagged). A
/// group with zero standard deviation gets z = 0 everywhere and no flags.
/// Output preserves (group, date) order and carries every analyzed point.
pub fn detect_anomalies(
    grouped: &[(String, Vec<DailyCost>)],
    threshold: f64,
    min_observations: usize,
) -> Vec<AnomalyPoint> {
    let mut result = Vec::new();

    for (key, series) in grouped {
        if series.len() < min_observations {
            continue;
        }

        let costs: Vec<f64> = series.iter().map(|d| d.total_cost).collect();
        let (mean, stddev) = mean_and_stddev(&costs);

        for day in series {
            let z_score = if stddev > 0.0 {
                (day.total_cost - mean) / stddev
            } else {
                0.0
            };
            result.push(AnomalyPoint {
                key: key.clone(),
                date: day.date,
                cost: day.total_cost,
                z_score,
                is_anomaly: z_score.abs() > threshold,
            });
        }
    }

    result
}

/// Only the flagged points, sorted by |z| descending (presentation order).
pub fn flagged(points: &[AnomalyPoint]) -> Vec<AnomalyPoint> {
    let mut result: Vec<AnomalyPoint> = points.iter().filter(|p| p.is_anomaly).cloned().collect();
    result.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
    result
}

//! Aggregation engine for normalized CUR data
//!
//! Every operation here is a pure, deterministic function of the borrowed
//! dataset and its parameters: buckets sort by cost descending with ties
//! broken by key ascending, so identical inputs always produce identical
//! output and callers may cache results freely.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{LineItemType, NormalizedDataset, ReportSummary, UsageRecord};

/// Key of the synthetic remainder bucket emitted by top-N truncation
pub const OTHER_BUCKET: &str = "Other";

/// Which line items a grouped sum counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostScope {
    /// Charge line items only (default: gross usage view)
    Charges,
    /// Discounts, credits, and negations only
    Discounts,
    /// Everything, including the on-demand-equivalent covered usage
    Net,
}

impl CostScope {
    fn includes(self, line_item_type: LineItemType) -> bool {
        match self {
            CostScope::Charges => line_item_type.is_charge(),
            CostScope::Discounts => line_item_type.is_discount(),
            CostScope::Net => true,
        }
    }
}

/// One grouped cost bucket (service, account, or region)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBucket {
    pub key: String,
    pub total_cost: f64,
    pub record_count: u64,
}

/// One cell of the account × service cross-tabulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub account_id: String,
    pub service: String,
    pub total_cost: f64,
}

/// Cost summed over one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCost {
    pub date: NaiveDate,
    pub total_cost: f64,
    pub record_count: u64,
}

/// Cost summed over one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCost {
    /// "YYYY-MM"
    pub month: String,
    pub total_cost: f64,
    pub record_count: u64,
    pub avg_record_cost: f64,
}

/// One (group, month) point of a per-group monthly series, where the group
/// key is a service, account, or region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMonthlyCost {
    pub key: String,
    pub month: String,
    pub total_cost: f64,
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Aggregation engine over one normalized dataset
pub struct Aggregator<'a> {
    data: &'a NormalizedDataset,
}

impl<'a> Aggregator<'a> {
    pub fn new(data: &'a NormalizedDataset) -> Self {
        Self { data }
    }

    /// Gross cost per service, descending, with optional top-N + "Other".
    pub fn cost_by_service(&self, top_n: Option<usize>) -> Vec<CostBucket> {
        self.cost_by_service_scoped(top_n, CostScope::Charges)
    }

    pub fn cost_by_service_scoped(
        &self,
        top_n: Option<usize>,
        scope: CostScope,
    ) -> Vec<CostBucket> {
        self.grouped(scope, top_n, |r| r.service.as_str())
    }

    /// Gross cost per account, descending, with optional top-N + "Other".
    pub fn cost_by_account(&self, top_n: Option<usize>) -> Vec<CostBucket> {
        self.cost_by_account_scoped(top_n, CostScope::Charges)
    }

    pub fn cost_by_account_scoped(
        &self,
        top_n: Option<usize>,
        scope: CostScope,
    ) -> Vec<CostBucket> {
        self.grouped(scope, top_n, |r| r.account_id.as_str())
    }

    /// Gross cost per region. "Unknown" is a bucket like any other.
    pub fn cost_by_region(&self, top_n: Option<usize>) -> Vec<CostBucket> {
        self.cost_by_region_scoped(top_n, CostScope::Charges)
    }

    pub fn cost_by_region_scoped(
        &self,
        top_n: Option<usize>,
        scope: CostScope,
    ) -> Vec<CostBucket> {
        self.grouped(scope, top_n, |r| r.region.as_str())
    }

    /// Full account × service cross-tabulation over charge line items.
    /// Cells that sum to exactly zero are omitted, not stored as zero.
    /// Sorted by account ascending, then cost descending.
    pub fn account_service_matrix(&self) -> Vec<MatrixCell> {
        let mut cells: HashMap<(&str, &str), f64> = HashMap::new();
        for record in self.charge_records() {
            *cells
                .entry((record.account_id.as_str(), record.service.as_str()))
                .or_insert(0.0) += record.cost;
        }

        let mut result: Vec<MatrixCell> = cells
            .into_iter()
            .filter(|(_, total)| *total != 0.0)
            .map(|((account_id, service), total_cost)| MatrixCell {
                account_id: account_id.to_string(),
                service: service.to_string(),
                total_cost,
            })
            .collect();

        result.sort_by(|a, b| {
            a.account_id
                .cmp(&b.account_id)
                .then(b.total_cost.total_cmp(&a.total_cost))
                .then(a.service.cmp(&b.service))
        });
        result
    }

    /// Gross cost per calendar day, ascending. Sparse: days with no records
    /// are absent, never zero-filled.
    pub fn daily_trend(&self) -> Vec<DailyCost> {
        let mut days: HashMap<NaiveDate, (f64, u64)> = HashMap::new();
        for record in self.charge_records() {
            let entry = days.entry(record.usage_date).or_insert((0.0, 0));
            entry.0 += record.cost;
            entry.1 += 1;
        }

        let mut result: Vec<DailyCost> = days
            .into_iter()
            .map(|(date, (total_cost, record_count))| DailyCost {
                date,
                total_cost,
                record_count,
            })
            .collect();
        result.sort_by_key(|d| d.date);
        result
    }

    /// Gross cost per calendar month, ascending by month.
    pub fn monthly_summary(&self) -> Vec<MonthlyCost> {
        let mut months: HashMap<String, (f64, u64)> = HashMap::new();
        for record in self.charge_records() {
            let entry = months
                .entry(month_key(record.usage_date))
                .or_insert((0.0, 0));
            entry.0 += record.cost;
            entry.1 += 1;
        }

        let mut result: Vec<MonthlyCost> = months
            .into_iter()
            .map(|(month, (total_cost, record_count))| MonthlyCost {
                month,
                total_cost,
                record_count,
                avg_record_cost: total_cost / record_count as f64,
            })
            .collect();
        result.sort_by(|a, b| a.month.cmp(&b.month));
        result
    }

    /// Monthly gross cost series for the top-N services, sorted by service
    /// then month. Feeds per-group trend analysis and stacked charts.
    pub fn monthly_trend_by_service(&self, top_n: usize) -> Vec<GroupMonthlyCost> {
        self.monthly_trend_grouped(top_n, |r| r.service.as_str())
    }

    /// Monthly gross cost series for the top-N accounts.
    pub fn monthly_trend_by_account(&self, top_n: usize) -> Vec<GroupMonthlyCost> {
        self.monthly_trend_grouped(top_n, |r| r.account_id.as_str())
    }

    /// Monthly gross cost series for the top-N regions.
    pub fn monthly_trend_by_region(&self, top_n: usize) -> Vec<GroupMonthlyCost> {
        self.monthly_trend_grouped(top_n, |r| r.region.as_str())
    }

    fn monthly_trend_grouped<F>(&self, top_n: usize, key_fn: F) -> Vec<GroupMonthlyCost>
    where
        F: Fn(&UsageRecord) -> &str,
    {
        let top: Vec<String> = self
            .grouped(CostScope::Charges, None, &key_fn)
            .into_iter()
            .take(top_n)
            .map(|b| b.key)
            .collect();

        let mut cells: HashMap<(&str, String), f64> = HashMap::new();
        for record in self.charge_records() {
            let key = key_fn(record);
            if !top.iter().any(|k| k == key) {
                continue;
            }
            *cells
                .entry((key, month_key(record.usage_date)))
                .or_insert(0.0) += record.cost;
        }

        let mut result: Vec<GroupMonthlyCost> = cells
            .into_iter()
            .map(|((key, month), total_cost)| GroupMonthlyCost {
                key: key.to_string(),
                month,
                total_cost,
            })
            .collect();
        result.sort_by(|a, b| a.key.cmp(&b.key).then(a.month.cmp(&b.month)));
        result
    }

    /// Dashboard-level summary record
    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_dataset(self.data)
    }

    fn charge_records(&self) -> impl Iterator<Item = &UsageRecord> {
        self.data
            .records()
            .iter()
            .filter(|r| r.line_item_type.is_charge())
    }

    /// Shared group-fold: sum cost and count per key, sort, truncate.
    fn grouped<F>(&self, scope: CostScope, top_n: Option<usize>, key_fn: F) -> Vec<CostBucket>
    where
        F: Fn(&UsageRecord) -> &str,
    {
        let mut buckets: HashMap<&str, (f64, u64)> = HashMap::new();
        for record in self.data.records() {
            if !scope.includes(record.line_item_type) {
                continue;
            }
            let entry = buckets.entry(key_fn(record)).or_insert((0.0, 0));
            entry.0 += record.cost;
            entry.1 += 1;
        }

        let mut result: Vec<CostBucket> = buckets
            .into_iter()
            .map(|(key, (total_cost, record_count))| CostBucket {
                key: key.to_string(),
                total_cost,
                record_count,
            })
            .collect();

        result.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost).then(a.key.cmp(&b.key)));
        apply_top_n(result, top_n)
    }
}

/// Truncate to the top N buckets plus one synthetic "Other" bucket holding
/// the remainder. "Other" is only emitted when a remainder exists, so
/// `sum(top N) + Other == total` always holds.
fn apply_top_n(buckets: Vec<CostBucket>, top_n: Option<usize>) -> Vec<CostBucket> {
    let n = match top_n {
        Some(n) if n < buckets.len() => n,
        _ => return buckets,
    };

    let mut result: Vec<CostBucket> = Vec::with_capacity(n + 1);
    let mut other_cost = 0.0;
    let mut other_count = 0u64;

    for (i, bucket) in buckets.into_iter().enumerate() {
        if i < n {
            result.push(bucket);
        } else {
            other_cost += bucket.total_cost;
            other_count += bucket.record_count;
        }
    }

    result.push(CostBucket {
        key: OTHER_BUCKET.to_string(),
        total_cost: other_cost,
        record_count: other_count,
    });
    result
}

//! Normalized CUR record types
//!
//! Everything downstream of the schema normalizer operates on these types;
//! source-specific column names never escape the normalizer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// CUR line item type, parsed from the `line_item_type` column.
///
/// Variants mirror the types AWS emits. `is_charge` / `is_discount` define
/// the two categories the analyzers care about: actual charges versus the
/// credits/discounts/negations that offset them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineItemType {
    Usage,
    Tax,
    Fee,
    RiFee,
    /// The actual hourly cost of a Savings Plan commitment
    SavingsPlanRecurringFee,
    /// On-demand equivalent of usage a Savings Plan covered. Not a real
    /// charge: summing it alongside the recurring fee double-counts.
    SavingsPlanCoveredUsage,
    /// Offset that cancels SavingsPlanCoveredUsage (negative cost)
    SavingsPlanNegation,
    EdpDiscount,
    PrivateRateDiscount,
    BundledDiscount,
    Credit,
    Other,
}

impl LineItemType {
    /// Parse the raw CUR value. Unrecognized values map to `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Usage" | "DiscountedUsage" => Self::Usage,
            "Tax" => Self::Tax,
            "Fee" => Self::Fee,
            "RIFee" => Self::RiFee,
            "SavingsPlanRecurringFee" => Self::SavingsPlanRecurringFee,
            "SavingsPlanCoveredUsage" => Self::SavingsPlanCoveredUsage,
            "SavingsPlanNegation" => Self::SavingsPlanNegation,
            "EdpDiscount" => Self::EdpDiscount,
            "PrivateRateDiscount" => Self::PrivateRateDiscount,
            "BundledDiscount" => Self::BundledDiscount,
            "Credit" => Self::Credit,
            _ => Self::Other,
        }
    }

    /// True for line items that represent money actually charged.
    pub fn is_charge(self) -> bool {
        matches!(
            self,
            Self::Usage | Self::Tax | Self::Fee | Self::RiFee | Self::SavingsPlanRecurringFee
        )
    }

    /// True for discounts, credits, and savings-plan negations.
    pub fn is_discount(self) -> bool {
        matches!(
            self,
            Self::SavingsPlanNegation
                | Self::EdpDiscount
                | Self::PrivateRateDiscount
                | Self::BundledDiscount
                | Self::Credit
        )
    }

    /// Display name, matching the raw CUR spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usage => "Usage",
            Self::Tax => "Tax",
            Self::Fee => "Fee",
            Self::RiFee => "RIFee",
            Self::SavingsPlanRecurringFee => "SavingsPlanRecurringFee",
            Self::SavingsPlanCoveredUsage => "SavingsPlanCoveredUsage",
            Self::SavingsPlanNegation => "SavingsPlanNegation",
            Self::EdpDiscount => "EdpDiscount",
            Self::PrivateRateDiscount => "PrivateRateDiscount",
            Self::BundledDiscount => "BundledDiscount",
            Self::Credit => "Credit",
            Self::Other => "Other",
        }
    }
}

/// One CUR line item after normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub usage_date: NaiveDate,
    pub account_id: String,
    pub service: String,
    pub region: String,
    /// Unblended cost; negative for credits and negations. Always finite.
    pub cost: f64,
    pub line_item_type: LineItemType,
    pub resource_id: Option<String>,
}

/// An immutable, normalized CUR dataset for one report run.
///
/// Produced once by the schema normalizer and never mutated; a fresh dataset
/// supersedes it if re-normalization is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    records: Vec<UsageRecord>,
    /// Rows dropped during normalization (unparseable usage date)
    skipped_rows: usize,
}

impl NormalizedDataset {
    pub fn new(records: Vec<UsageRecord>, skipped_rows: usize) -> Self {
        Self {
            records,
            skipped_rows,
        }
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Inclusive date span of the data, None when empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.usage_date).min()?;
        let max = self.records.iter().map(|r| r.usage_date).max()?;
        Some((min, max))
    }
}

/// Dashboard-level summary record handed to the report assembler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Gross cost: charge line items only
    pub total_cost: f64,
    /// Net cost after discounts/credits/negations
    pub net_cost: f64,
    /// Sum of all discounts, reported positive
    pub total_discounts: f64,
    pub account_count: usize,
    pub service_count: usize,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub record_count: usize,
}

impl ReportSummary {
    pub fn from_dataset(data: &NormalizedDataset) -> Self {
        let mut total_cost = 0.0;
        let mut net_cost = 0.0;
        let mut accounts: HashSet<&str> = HashSet::new();
        let mut services: HashSet<&str> = HashSet::new();

        for record in data.records() {
            net_cost += record.cost;
            if record.line_item_type.is_charge() {
                total_cost += record.cost;
            }
            accounts.insert(record.account_id.as_str());
            services.insert(record.service.as_str());
        }

        let (date_start, date_end) = match data.date_range() {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };

        Self {
            total_cost,
            net_cost,
            total_discounts: total_cost - net_cost,
            account_count: accounts.len(),
            service_count: services.len(),
            date_start,
            date_end,
            record_count: data.len(),
        }
    }
}

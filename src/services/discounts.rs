//! Discount and savings-plan analysis
//!
//! Separates discount/credit/negation line items from usage charges and
//! reports how effective they are per calendar month. Discount amounts are
//! negative in raw CUR data; they are reported positive here.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{LineItemType, NormalizedDataset};

/// Discount total for one (month, key) pair, where key is a discount type
/// name or a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountBucket {
    /// "YYYY-MM"
    pub period: String,
    pub key: String,
    /// Absolute discount amount (raw data is negative)
    pub total_discount: f64,
    /// Discount relative to the period's gross charge cost; 0 when the
    /// period has no gross charges
    pub ratio_of_gross: f64,
}

/// Savings-plan effectiveness for one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlanService {
    pub service: String,
    /// What the covered usage would have cost on-demand
    pub on_demand_equivalent: f64,
    /// Savings-plan recurring fees attributed to the service
    pub savings_plan_cost: f64,
    /// Amount the negation offset (positive)
    pub savings: f64,
    /// (equivalent − actual) / equivalent, clamped to [0, 1]
    pub effectiveness: f64,
}

/// Savings-plan effectiveness for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlanPeriod {
    /// "YYYY-MM"
    pub period: String,
    /// What the covered usage would have cost on-demand
    pub on_demand_equivalent: f64,
    /// Savings-plan recurring fees charged in the period
    pub savings_plan_cost: f64,
    /// Amount the negation offset (positive)
    pub savings: f64,
    /// (equivalent − actual) / equivalent, clamped to [0, 1]
    pub effectiveness: f64,
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Discount/savings analyzer over one normalized dataset
pub struct DiscountAnalyzer<'a> {
    data: &'a NormalizedDataset,
}

impl<'a> DiscountAnalyzer<'a> {
    pub fn new(data: &'a NormalizedDataset) -> Self {
        Self { data }
    }

    /// Monthly discount totals per discount type. Sorted by month, then by
    /// amount descending. Months without discounts are absent.
    pub fn discounts_by_type(&self) -> Vec<DiscountBucket> {
        let gross = self.gross_by_month();

        let mut totals: HashMap<(String, &'static str), f64> = HashMap::new();
        for record in self.data.records() {
            if !record.line_item_type.is_discount() {
                continue;
            }
            *totals
                .entry((month_key(record.usage_date), record.line_item_type.as_str()))
                .or_insert(0.0) += record.cost;
        }

        Self::into_buckets(totals, &gross)
    }

    /// Monthly discount totals per service, limited to the top-N services
    /// by overall discount amount (None = all services).
    pub fn discounts_by_service(&self, top_n: Option<usize>) -> Vec<DiscountBucket> {
        let gross = self.gross_by_month();

        // Overall discount per service picks the top-N set
        let mut per_service: HashMap<&str, f64> = HashMap::new();
        for record in self.data.records() {
            if record.line_item_type.is_discount() {
                *per_service.entry(record.service.as_str()).or_insert(0.0) += record.cost;
            }
        }
        let mut ranked: Vec<(&str, f64)> = per_service.into_iter().collect();
        // Raw totals are negative: most negative is the biggest discount
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(b.0)));
        let keep: Vec<&str> = match top_n {
            Some(n) => ranked.iter().take(n).map(|(s, _)| *s).collect(),
            None => ranked.iter().map(|(s, _)| *s).collect(),
        };

        let mut totals: HashMap<(String, &str), f64> = HashMap::new();
        for record in self.data.records() {
            if !record.line_item_type.is_discount() {
                continue;
            }
            if !keep.contains(&record.service.as_str()) {
                continue;
            }
            *totals
                .entry((month_key(record.usage_date), record.service.as_str()))
                .or_insert(0.0) += record.cost;
        }

        Self::into_buckets(totals, &gross)
    }

    /// Savings-plan effectiveness per month.
    ///
    /// Only months carrying both components are reported: the negation
    /// rows (the realized offset) and the covered-usage rows (the
    /// on-demand counterfactual). Months lacking either are omitted, never
    /// estimated. Effectiveness is clamped to [0, 1] so data anomalies
    /// (negation exceeding covered usage) cannot produce nonsensical
    /// ratios.
    pub fn savings_plan_effectiveness(&self) -> Vec<SavingsPlanPeriod> {
        #[derive(Default)]
        struct MonthAccumulator {
            covered: f64,
            negation: f64,
            recurring_fee: f64,
            has_negation: bool,
            has_covered: bool,
        }

        let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();
        for record in self.data.records() {
            let acc = months.entry(month_key(record.usage_date)).or_default();
            match record.line_item_type {
                LineItemType::SavingsPlanCoveredUsage => {
                    acc.covered += record.cost;
                    acc.has_covered = true;
                }
                LineItemType::SavingsPlanNegation => {
                    acc.negation += record.cost;
                    acc.has_negation = true;
                }
                LineItemType::SavingsPlanRecurringFee => {
                    acc.recurring_fee += record.cost;
                }
                _ => {}
            }
        }

        months
            .into_iter()
            .filter(|(_, acc)| acc.has_negation && acc.has_covered && acc.covered > 0.0)
            .map(|(period, acc)| {
                let actual = acc.covered + acc.negation;
                let effectiveness =
                    ((acc.covered - actual) / acc.covered).clamp(0.0, 1.0);
                SavingsPlanPeriod {
                    period,
                    on_demand_equivalent: acc.covered,
                    savings_plan_cost: acc.recurring_fee,
                    savings: -acc.negation,
                    effectiveness,
                }
            })
            .collect()
    }

    /// Savings-plan effectiveness per service, sorted by on-demand
    /// equivalent descending.
    ///
    /// Services with no covered-usage rows have no counterfactual and are
    /// omitted; a covered service without negation rows reports zero
    /// savings rather than disappearing.
    pub fn savings_plan_by_service(&self) -> Vec<SavingsPlanService> {
        #[derive(Default)]
        struct ServiceAccumulator {
            covered: f64,
            negation: f64,
            recurring_fee: f64,
            has_covered: bool,
        }

        let mut services: HashMap<&str, ServiceAccumulator> = HashMap::new();
        for record in self.data.records() {
            let acc = services.entry(record.service.as_str()).or_default();
            match record.line_item_type {
                LineItemType::SavingsPlanCoveredUsage => {
                    acc.covered += record.cost;
                    acc.has_covered = true;
                }
                LineItemType::SavingsPlanNegation => acc.negation += record.cost,
                LineItemType::SavingsPlanRecurringFee => acc.recurring_fee += record.cost,
                _ => {}
            }
        }

        let mut result: Vec<SavingsPlanService> = services
            .into_iter()
            .filter(|(_, acc)| acc.has_covered && acc.covered > 0.0)
            .map(|(service, acc)| {
                let actual = acc.covered + acc.negation;
                let effectiveness = ((acc.covered - actual) / acc.covered).clamp(0.0, 1.0);
                SavingsPlanService {
                    service: service.to_string(),
                    on_demand_equivalent: acc.covered,
                    savings_plan_cost: acc.recurring_fee,
                    savings: -acc.negation,
                    effectiveness,
                }
            })
            .collect();

        result.sort_by(|a, b| {
            b.on_demand_equivalent
                .total_cmp(&a.on_demand_equivalent)
                .then(a.service.cmp(&b.service))
        });
        result
    }

    /// Gross charge cost per month, the denominator of discount ratios
    fn gross_by_month(&self) -> HashMap<String, f64> {
        let mut gross: HashMap<String, f64> = HashMap::new();
        for record in self.data.records() {
            if record.line_item_type.is_charge() {
                *gross.entry(month_key(record.usage_date)).or_insert(0.0) += record.cost;
            }
        }
        gross
    }

    fn into_buckets(
        totals: HashMap<(String, &str), f64>,
        gross: &HashMap<String, f64>,
    ) -> Vec<DiscountBucket> {
        let mut result: Vec<DiscountBucket> = totals
            .into_iter()
            .map(|((period, key), total)| {
                let total_discount = total.abs();
                let ratio_of_gross = match gross.get(&period) {
                    Some(&g) if g > 0.0 => total_discount / g,
                    _ => 0.0,
                };
                DiscountBucket {
                    period,
                    key: key.to_string(),
                    total_discount,
                    ratio_of_gross,
                }
            })
            .collect();

        result.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then(b.total_discount.total_cmp(&a.total_discount))
                .then(a.key.cmp(&b.key))
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageRecord;

    fn record(
        month: u32,
        day: u32,
        service: &str,
        cost: f64,
        line_item_type: LineItemType,
    ) -> UsageRecord {
        UsageRecord {
            usage_date: NaiveDate::from_ymd_opt(2024, month, day).unwrap(),
            account_id: "111122223333".to_string(),
            service: service.to_string(),
            region: "us-east-1".to_string(),
            cost,
            line_item_type,
            resource_id: None,
        }
    }

    fn dataset(records: Vec<UsageRecord>) -> NormalizedDataset {
        NormalizedDataset::new(records, 0)
    }

    // ========== discounts_by_type ==========

    #[test]
    fn test_discounts_by_type_abs_and_ratio() {
        let data = dataset(vec![
            record(1, 10, "AmazonEC2", 1000.0, LineItemType::Usage),
            record(1, 12, "AmazonEC2", -100.0, LineItemType::Credit),
            record(1, 15, "AmazonEC2", -50.0, LineItemType::EdpDiscount),
        ]);
        let result = DiscountAnalyzer::new(&data).discounts_by_type();

        assert_eq!(result.len(), 2);
        // Largest discount first within the month
        assert_eq!(result[0].key, "Credit");
        assert!((result[0].total_discount - 100.0).abs() < 1e-9);
        assert!((result[0].ratio_of_gross - 0.1).abs() < 1e-9);
        assert_eq!(result[1].key, "EdpDiscount");
        assert!((result[1].ratio_of_gross - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_discounts_span_months() {
        let data = dataset(vec![
            record(1, 10, "AmazonEC2", 500.0, LineItemType::Usage),
            record(1, 12, "AmazonEC2", -50.0, LineItemType::Credit),
            record(2, 12, "AmazonEC2", -25.0, LineItemType::Credit),
        ]);
        let result = DiscountAnalyzer::new(&data).discounts_by_type();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].period, "2024-01");
        assert_eq!(result[1].period, "2024-02");
        // February has no gross charges: ratio defined as 0
        assert!((result[1].ratio_of_gross - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_discounts_empty_output() {
        let data = dataset(vec![record(1, 10, "AmazonEC2", 100.0, LineItemType::Usage)]);
        assert!(DiscountAnalyzer::new(&data).discounts_by_type().is_empty());
    }

    // ========== discounts_by_service ==========

    #[test]
    fn test_discounts_by_service_top_n() {
        let data = dataset(vec![
            record(1, 1, "AmazonEC2", 1000.0, LineItemType::Usage),
            record(1, 5, "AmazonEC2", -300.0, LineItemType::Credit),
            record(1, 5, "AmazonS3", -20.0, LineItemType::Credit),
            record(1, 5, "AmazonRDS", -10.0, LineItemType::Credit),
        ]);
        let result = DiscountAnalyzer::new(&data).discounts_by_service(Some(2));

        let keys: Vec<&str> = result.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["AmazonEC2", "AmazonS3"]);
        assert!((result[0].total_discount - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_discounts_by_service_all() {
        let data = dataset(vec![
            record(1, 5, "AmazonEC2", -30.0, LineItemType::BundledDiscount),
            record(1, 5, "AmazonS3", -20.0, LineItemType::PrivateRateDiscount),
        ]);
        let result = DiscountAnalyzer::new(&data).discounts_by_service(None);
        assert_eq!(result.len(), 2);
    }

    // ========== savings_plan_effectiveness ==========

    #[test]
    fn test_savings_plan_realized_ratio() {
        // Covered usage $1200 on-demand equivalent, negation −$300:
        // actual = $900, effectiveness = (1200 − 900) / 1200 = 0.25
        let data = dataset(vec![
            record(1, 1, "AmazonEC2", 1000.0, LineItemType::Usage),
            record(1, 2, "AmazonEC2", 1200.0, LineItemType::SavingsPlanCoveredUsage),
            record(1, 2, "AmazonEC2", -300.0, LineItemType::SavingsPlanNegation),
            record(1, 2, "AmazonEC2", 850.0, LineItemType::SavingsPlanRecurringFee),
        ]);
        let result = DiscountAnalyzer::new(&data).savings_plan_effectiveness();

        assert_eq!(result.len(), 1);
        let period = &result[0];
        assert_eq!(period.period, "2024-01");
        assert!((period.on_demand_equivalent - 1200.0).abs() < 1e-9);
        assert!((period.savings - 300.0).abs() < 1e-9);
        assert!((period.savings_plan_cost - 850.0).abs() < 1e-9);
        assert!((period.effectiveness - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_savings_plan_period_without_negation_omitted() {
        let data = dataset(vec![
            record(1, 2, "AmazonEC2", 1200.0, LineItemType::SavingsPlanCoveredUsage),
            record(2, 2, "AmazonEC2", 1100.0, LineItemType::SavingsPlanCoveredUsage),
            record(2, 2, "AmazonEC2", -200.0, LineItemType::SavingsPlanNegation),
        ]);
        let result = DiscountAnalyzer::new(&data).savings_plan_effectiveness();

        // January lacks the negation component and is omitted, not zeroed
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].period, "2024-02");
    }

    #[test]
    fn test_savings_plan_period_without_covered_usage_omitted() {
        // The counterfactual cannot be reconstructed: omit, don't guess
        let data = dataset(vec![
            record(1, 2, "AmazonEC2", -200.0, LineItemType::SavingsPlanNegation),
            record(1, 2, "AmazonEC2", 500.0, LineItemType::Usage),
        ]);
        assert!(DiscountAnalyzer::new(&data)
            .savings_plan_effectiveness()
            .is_empty());
    }

    #[test]
    fn test_effectiveness_clamped_on_data_anomaly() {
        // Negation larger than covered usage would push the ratio past 1
        let data = dataset(vec![
            record(1, 2, "AmazonEC2", 100.0, LineItemType::SavingsPlanCoveredUsage),
            record(1, 2, "AmazonEC2", -250.0, LineItemType::SavingsPlanNegation),
        ]);
        let result = DiscountAnalyzer::new(&data).savings_plan_effectiveness();
        assert_eq!(result.len(), 1);
        assert!((result[0].effectiveness - 1.0).abs() < 1e-9);
    }

    // ========== savings_plan_by_service ==========

    #[test]
    fn test_savings_plan_by_service_sorted_by_equivalent() {
        let data = dataset(vec![
            record(1, 2, "AmazonRDS", 400.0, LineItemType::SavingsPlanCoveredUsage),
            record(1, 2, "AmazonRDS", -100.0, LineItemType::SavingsPlanNegation),
            record(1, 3, "AmazonEC2", 1200.0, LineItemType::SavingsPlanCoveredUsage),
            record(1, 3, "AmazonEC2", -300.0, LineItemType::SavingsPlanNegation),
            record(1, 3, "AmazonEC2", 850.0, LineItemType::SavingsPlanRecurringFee),
        ]);
        let result = DiscountAnalyzer::new(&data).savings_plan_by_service();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].service, "AmazonEC2");
        assert!((result[0].on_demand_equivalent - 1200.0).abs() < 1e-9);
        assert!((result[0].savings - 300.0).abs() < 1e-9);
        assert!((result[0].savings_plan_cost - 850.0).abs() < 1e-9);
        assert!((result[0].effectiveness - 0.25).abs() < 1e-9);
        assert_eq!(result[1].service, "AmazonRDS");
        assert!((result[1].effectiveness - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_savings_plan_by_service_uncovered_service_omitted() {
        let data = dataset(vec![
            record(1, 2, "AmazonEC2", 600.0, LineItemType::SavingsPlanCoveredUsage),
            record(1, 2, "AmazonEC2", -150.0, LineItemType::SavingsPlanNegation),
            record(1, 2, "AmazonS3", 500.0, LineItemType::Usage),
            record(1, 2, "AmazonS3", -50.0, LineItemType::SavingsPlanNegation),
        ]);
        let result = DiscountAnalyzer::new(&data).savings_plan_by_service();

        // S3 has negation but no covered usage: no counterfactual, omitted
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].service, "AmazonEC2");
    }

    #[test]
    fn test_savings_plan_by_service_covered_without_negation() {
        let data = dataset(vec![record(
            1,
            2,
            "AmazonEC2",
            600.0,
            LineItemType::SavingsPlanCoveredUsage,
        )]);
        let result = DiscountAnalyzer::new(&data).savings_plan_by_service();

        // Covered but nothing offset yet: reported with zero savings
        assert_eq!(result.len(), 1);
        assert!((result[0].savings - 0.0).abs() < f64::EPSILON);
        assert!((result[0].effectiveness - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_savings_plan_activity_empty() {
        let data = dataset(vec![record(1, 1, "AmazonEC2", 100.0, LineItemType::Usage)]);
        assert!(DiscountAnalyzer::new(&data)
            .savings_plan_effectiveness()
            .is_empty());
    }
}

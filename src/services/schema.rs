//! Schema normalizer
//!
//! AWS has shipped two CUR column-naming generations: the legacy
//! slash-delimited names (`lineItem/UnblendedCost`) and the current
//! snake_case names (`line_item_unblended_cost`). This module is the one
//! place that knows about both; everything downstream sees only the
//! canonical field names on `UsageRecord`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::reader::RawTable;
use crate::types::{CurError, LineItemType, NormalizedDataset, Result, UsageRecord};

/// Ordered alias lists per canonical field. The first alias present in the
/// input column set wins.
const COST_ALIASES: &[&str] = &[
    "line_item_unblended_cost",
    "lineItem/UnblendedCost",
    "line_item_blended_cost",
    "lineItem/BlendedCost",
    "cost",
    "unblended_cost",
];

const USAGE_DATE_ALIASES: &[&str] = &[
    "line_item_usage_start_date",
    "lineItem/UsageStartDate",
    "usage_start_date",
    "bill_billing_period_start_date",
];

const ACCOUNT_ID_ALIASES: &[&str] = &[
    "line_item_usage_account_id",
    "lineItem/UsageAccountId",
    "usage_account_id",
    "bill_payer_account_id",
];

const SERVICE_ALIASES: &[&str] = &[
    "line_item_product_code",
    "lineItem/ProductCode",
    "product_product_name",
    "product/ProductName",
    "service",
    "product_name",
];

const REGION_ALIASES: &[&str] = &[
    "product_region",
    "product/region",
    "line_item_availability_zone",
    "lineItem/AvailabilityZone",
    "region",
];

const RESOURCE_ID_ALIASES: &[&str] = &[
    "line_item_resource_id",
    "lineItem/ResourceId",
    "resource_id",
];

const LINE_ITEM_TYPE_ALIASES: &[&str] = &[
    "lineItem/LineItemType",
    "line_item_line_item_type",
    "line_item_type",
];

/// Fill value for absent optional string dimensions, so grouping never has
/// to special-case missing keys.
const UNKNOWN: &str = "Unknown";

/// Resolved column indices for one input table
struct ColumnMap {
    cost: usize,
    usage_date: usize,
    account_id: usize,
    service: Option<usize>,
    region: Option<usize>,
    resource_id: Option<usize>,
    line_item_type: Option<usize>,
}

fn find_column(table: &RawTable, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| table.column_index(alias))
}

fn require_column(
    table: &RawTable,
    aliases: &[&str],
    field: &'static str,
) -> Result<usize> {
    find_column(table, aliases).ok_or(CurError::Schema { field })
}

impl ColumnMap {
    fn resolve(table: &RawTable) -> Result<Self> {
        Ok(Self {
            cost: require_column(table, COST_ALIASES, "cost")?,
            usage_date: require_column(table, USAGE_DATE_ALIASES, "usage_date")?,
            account_id: require_column(table, ACCOUNT_ID_ALIASES, "account_id")?,
            service: find_column(table, SERVICE_ALIASES),
            region: find_column(table, REGION_ALIASES),
            resource_id: find_column(table, RESOURCE_ID_ALIASES),
            line_item_type: find_column(table, LINE_ITEM_TYPE_ALIASES),
        })
    }
}

/// Parse a CUR usage date. AWS emits ISO 8601 with timezone
/// (`2024-01-15T00:00:00Z`); bare datetimes and bare dates also appear in
/// hand-trimmed exports.
fn parse_usage_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Parse a cost cell. Unparseable or non-finite values coerce to 0.0; the
/// sign is preserved (credits and negations are legitimately negative).
fn parse_cost(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn string_cell(table: &RawTable, row: &[String], index: Option<usize>) -> String {
    match index {
        Some(i) => {
            let value = table.cell(row, i).trim();
            if value.is_empty() {
                UNKNOWN.to_string()
            } else {
                value.to_string()
            }
        }
        None => UNKNOWN.to_string(),
    }
}

/// Normalize a raw CUR table onto the canonical schema.
///
/// Mandatory fields (cost, account id, usage date) abort the run with a
/// `Schema` error when no alias matches. Rows whose usage date cannot be
/// parsed are dropped and counted. A table with no usable rows yields
/// `EmptyDataset` so callers can render a "no data" report instead of
/// crashing on zero-filled aggregates.
pub fn normalize(table: &RawTable) -> Result<NormalizedDataset> {
    let map = ColumnMap::resolve(table)?;

    let mut records = Vec::with_capacity(table.rows().len());
    let mut skipped = 0usize;

    for row in table.rows() {
        let date = match parse_usage_date(table.cell(row, map.usage_date)) {
            Some(date) => date,
            None => {
                skipped += 1;
                continue;
            }
        };

        let line_item_type = match map.line_item_type {
            Some(i) => LineItemType::parse(table.cell(row, i).trim()),
            // No line-item-type column: treat everything as a charge
            None => LineItemType::Usage,
        };

        let resource_id = map.resource_id.and_then(|i| {
            let value = table.cell(row, i).trim();
            (!value.is_empty()).then(|| value.to_string())
        });

        records.push(UsageRecord {
            usage_date: date,
            account_id: string_cell(table, row, Some(map.account_id)),
            service: string_cell(table, row, map.service),
            region: string_cell(table, row, map.region),
            cost: parse_cost(table.cell(row, map.cost)),
            line_item_type,
            resource_id,
        });
    }

    if records.is_empty() {
        return Err(CurError::EmptyDataset);
    }

    Ok(NormalizedDataset::new(records, skipped))
}

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::core::fingerprint::{Granularity, Query};
use crate::core::models::summary::RawLineItem;

/// Base daily spend per demo service, in cents, plus a wobble amplitude
/// so the series is not perfectly flat.
const DEMO_SERVICES: &[(&str, i64, i64)] = &[
    ("Amazon EC2", 4115, 600),
    ("Amazon RDS", 1810, 300),
    ("Amazon S3", 1070, 150),
    ("AWS Lambda", 660, 200),
    ("CloudWatch", 290, 80),
];

/// Offline data source producing deterministic synthetic line items: the
/// same query always yields the same payload, so cached and fresh runs
/// agree and tests need no network.
#[derive(Debug, Default)]
pub struct DemoCostSource;

impl DemoCostSource {
    pub fn new() -> Self {
        Self
    }

    pub fn fetch(&self, query: &Query) -> Vec<RawLineItem> {
        let daily = self.daily_items(query);
        match query.granularity {
            Granularity::Daily => daily,
            Granularity::Monthly => monthly_rollup(daily),
        }
    }

    fn daily_items(&self, query: &Query) -> Vec<RawLineItem> {
        let filters = query.canonical_filters();
        let service_filter = filters
            .iter()
            .find(|(k, _)| k == "service")
            .map(|(_, v)| v.as_str());

        let mut items = Vec::new();
        let mut day = query.window.start;
        while day <= query.window.end {
            let ordinal = day.num_days_from_ce() as i64;
            for (idx, (service, base_cents, amplitude)) in DEMO_SERVICES.iter().enumerate() {
                if let Some(needle) = service_filter {
                    if !service.to_lowercase().contains(needle) {
                        continue;
                    }
                }
                // Pseudo-random but fully determined by date and service.
                let seed = ordinal.wrapping_mul(2_654_435_761).wrapping_add(idx as i64 * 97);
                let wobble = seed.rem_euclid(2 * amplitude + 1) - amplitude;
                items.push(RawLineItem {
                    service: service.to_string(),
                    date: day,
                    amount: Decimal::new(base_cents + wobble, 2),
                    currency: "USD".to_string(),
                });
            }
            day = day.succ_opt().expect("date overflow");
        }
        items
    }
}

/// Collapse daily items into one line per service per calendar month,
/// dated at the first of that month.
fn monthly_rollup(items: Vec<RawLineItem>) -> Vec<RawLineItem> {
    let mut buckets: BTreeMap<(i32, u32, String), Decimal> = BTreeMap::new();
    for item in items {
        *buckets
            .entry((item.date.year(), item.date.month(), item.service))
            .or_insert(Decimal::ZERO) += item.amount;
    }
    buckets
        .into_iter()
        .map(|((year, month, service), amount)| RawLineItem {
            service,
            date: NaiveDate::from_ymd_opt(year, month, 1).expect("bucketed from a valid date"),
            amount,
            currency: "USD".to_string(),
        })
        .collect()
}

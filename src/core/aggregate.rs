use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::models::summary::{PeriodSummary, RawLineItem, ServiceCost};
use crate::core::window::Window;

/// How far the service percentages may drift from 100.0 before we call
/// the rollup broken.
pub const PERCENTAGE_EPSILON: f64 = 0.05;

/// Reduce raw line items into a deterministic per-service rollup for one
/// window. Re-aggregating the same input always yields an identical
/// summary; an empty input yields a zero summary, not an error.
pub fn aggregate(items: &[RawLineItem], window: Window) -> PeriodSummary {
    let days = Decimal::from(window.days().max(1));

    let mut by_service: HashMap<&str, Decimal> = HashMap::new();
    let mut total = Decimal::ZERO;
    let mut currency: Option<&str> = None;
    for item in items {
        *by_service.entry(item.service.as_str()).or_insert(Decimal::ZERO) += item.amount;
        total += item.amount;
        currency.get_or_insert(item.currency.as_str());
    }

    let mut services: Vec<ServiceCost> = by_service
        .into_iter()
        .map(|(service, cost)| {
            // Guarded branch, not a caught exception: a zero total means
            // every percentage is 0.0 and no division happens.
            let percentage = if total > Decimal::ZERO {
                ((cost / total) * Decimal::from(100)).to_f64().unwrap_or(0.0)
            } else {
                0.0
            };
            ServiceCost {
                service: service.to_string(),
                total_cost: cost,
                percentage_of_total: percentage,
                daily_average: cost / days,
            }
        })
        .collect();
    services.sort_by(|a, b| {
        b.total_cost
            .cmp(&a.total_cost)
            .then_with(|| a.service.cmp(&b.service))
    });

    let summary = PeriodSummary {
        window,
        total_cost: total,
        daily_average: total / days,
        currency: currency.unwrap_or("USD").to_string(),
        services,
    };

    // Anything failing here is an aggregation bug, not bad input.
    assert!(
        summary.total_cost >= Decimal::ZERO,
        "aggregated total is negative: {}",
        summary.total_cost
    );
    if summary.total_cost > Decimal::ZERO {
        let pct_sum: f64 = summary
            .services
            .iter()
            .map(|s| s.percentage_of_total)
            .sum();
        assert!(
            (pct_sum - 100.0).abs() <= PERCENTAGE_EPSILON,
            "service percentages sum to {}, expected ~100",
            pct_sum
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn window_days(days: i64) -> Window {
        let end = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        Window::last_days(days, end).unwrap()
    }

    fn item(service: &str, day: u32, amount: Decimal) -> RawLineItem {
        RawLineItem {
            service: service.into(),
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            amount,
            currency: "USD".into(),
        }
    }

    #[test]
    fn ec2_and_s3_split_over_thirty_days() {
        let items = vec![
            item("Amazon EC2", 10, dec!(600)),
            item("Amazon S3", 12, dec!(400)),
        ];
        let summary = aggregate(&items, window_days(30));

        assert_eq!(summary.total_cost, dec!(1000));
        assert_eq!(summary.services.len(), 2);
        assert_eq!(summary.services[0].service, "Amazon EC2");
        assert!((summary.services[0].percentage_of_total - 60.0).abs() < 1e-9);
        assert!((summary.services[1].percentage_of_total - 40.0).abs() < 1e-9);
        assert_eq!(summary.daily_average, dec!(1000) / dec!(30));
    }

    #[test]
    fn groups_multiple_items_per_service() {
        let items = vec![
            item("Amazon EC2", 1, dec!(10.50)),
            item("Amazon EC2", 2, dec!(4.50)),
            item("Amazon S3", 1, dec!(5.00)),
        ];
        let summary = aggregate(&items, window_days(2));
        assert_eq!(summary.total_cost, dec!(20.00));
        assert_eq!(summary.services[0].total_cost, dec!(15.00));
        assert_eq!(summary.services[0].daily_average, dec!(7.50));
    }

    #[test]
    fn services_ordered_by_cost_then_name() {
        let items = vec![
            item("Amazon S3", 1, dec!(100)),
            item("Amazon EC2", 1, dec!(100)),
            item("CloudWatch", 1, dec!(250)),
        ];
        let summary = aggregate(&items, window_days(1));
        let names: Vec<&str> = summary.services.iter().map(|s| s.service.as_str()).collect();
        assert_eq!(names, vec!["CloudWatch", "Amazon EC2", "Amazon S3"]);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let items = vec![
            item("A", 1, dec!(33.33)),
            item("B", 1, dec!(33.33)),
            item("C", 1, dec!(33.34)),
        ];
        let summary = aggregate(&items, window_days(7));
        let pct_sum: f64 = summary.services.iter().map(|s| s.percentage_of_total).sum();
        assert!((pct_sum - 100.0).abs() <= PERCENTAGE_EPSILON);
    }

    #[test]
    fn empty_input_yields_zero_summary() {
        let summary = aggregate(&[], window_days(30));
        assert_eq!(summary.total_cost, Decimal::ZERO);
        assert_eq!(summary.daily_average, Decimal::ZERO);
        assert!(summary.services.is_empty());
    }

    #[test]
    fn zero_total_avoids_division() {
        let items = vec![item("Amazon EC2", 1, dec!(0)), item("Amazon S3", 2, dec!(0))];
        let summary = aggregate(&items, window_days(30));
        assert_eq!(summary.total_cost, Decimal::ZERO);
        for s in &summary.services {
            assert_eq!(s.percentage_of_total, 0.0);
        }
    }

    #[test]
    fn daily_average_uses_window_length() {
        let items = vec![item("Amazon EC2", 1, dec!(70))];
        let summary = aggregate(&items, window_days(7));
        assert_eq!(summary.daily_average, dec!(10));
        assert_eq!(summary.services[0].daily_average, dec!(10));
    }

    #[test]
    fn reaggregation_is_deterministic() {
        let items = vec![
            item("Amazon EC2", 1, dec!(12.345)),
            item("Amazon S3", 2, dec!(0.655)),
            item("Amazon EC2", 3, dec!(1.0)),
        ];
        let a = aggregate(&items, window_days(30));
        let b = aggregate(&items, window_days(30));
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::models::summary::PeriodSummary;
use crate::core::models::trend::{TrendDirection, TrendReport, TrendResult};

/// Capped percentage reported for a service with no baseline spend. The
/// real ratio is undefined; this is a flag, not a computation.
pub const NEW_SERVICE_PCT: f64 = 100.0;

fn trend_between(current: Decimal, baseline: Decimal, stable_pct: f64) -> TrendResult {
    let absolute_change = current - baseline;

    let (percentage_change, is_new) = if !baseline.is_zero() {
        let pct = ((absolute_change / baseline) * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0);
        (pct, false)
    } else if current > Decimal::ZERO {
        (NEW_SERVICE_PCT, true)
    } else {
        (0.0, false)
    };

    let direction = if percentage_change > stable_pct {
        TrendDirection::Up
    } else if percentage_change < -stable_pct {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    TrendResult {
        direction,
        percentage_change,
        absolute_change,
        is_new,
    }
}

/// Compare a current period against a baseline period.
///
/// Every service seen in either period gets an entry; the missing side
/// counts as zero, so a brand-new service reads as up/new and a vanished
/// one as down/-100%. `stable_pct` is the configured dead band around
/// zero movement.
pub fn compare(current: &PeriodSummary, baseline: &PeriodSummary, stable_pct: f64) -> TrendReport {
    let mut costs: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for s in &current.services {
        costs.entry(s.service.as_str()).or_default().0 = s.total_cost;
    }
    for s in &baseline.services {
        costs.entry(s.service.as_str()).or_default().1 = s.total_cost;
    }

    let by_service = costs
        .into_iter()
        .map(|(name, (cur, base))| (name.to_string(), trend_between(cur, base, stable_pct)))
        .collect();

    TrendReport {
        total: trend_between(current.total_cost, baseline.total_cost, stable_pct),
        by_service,
    }
}

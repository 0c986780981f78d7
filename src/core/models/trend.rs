use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Period-over-period movement for a total or a single service.
///
/// `is_new` marks the baseline == 0, current > 0 case: the percentage is
/// then a capped sentinel, not a computed ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub percentage_change: f64,
    pub absolute_change: Decimal,
    pub is_new: bool,
}

/// Trend of the period total plus one entry per service seen in either
/// the current or the baseline period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub total: TrendResult,
    pub by_service: BTreeMap<String, TrendResult>,
}

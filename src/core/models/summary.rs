use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::window::Window;

/// A single raw cost record as returned by the billing source.
/// Immutable once fetched; amounts are exact decimals, never floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLineItem {
    pub service: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
}

/// Per-service slice of a period's spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCost {
    pub service: String,
    pub total_cost: Decimal,
    pub percentage_of_total: f64,
    pub daily_average: Decimal,
}

/// Deterministic rollup of one window's raw line items.
///
/// Services are ordered by total cost descending, ties broken by name
/// ascending. Percentages sum to 100 within a 0.05 epsilon whenever the
/// total is positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub window: Window,
    pub total_cost: Decimal,
    pub daily_average: Decimal,
    pub currency: String,
    pub services: Vec<ServiceCost>,
}

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    ConcentrationRisk,
    SpendSpike,
    RisingWatchlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::High => "high",
        }
    }
}

/// Numeric values backing a signal's claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalEvidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_of_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_amount: Option<Decimal>,
}

/// A derived, human-actionable observation about cost behavior.
/// Stateless: recomputed on every run, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub severity: Severity,
    pub service: String,
    pub title: String,
    pub evidence: SignalEvidence,
    pub action: String,
}

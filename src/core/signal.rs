use crate::core::config::Thresholds;
use crate::core::models::signal::{Severity, Signal, SignalEvidence, SignalKind};
use crate::core::models::summary::PeriodSummary;
use crate::core::models::trend::{TrendDirection, TrendReport};

/// Derive ranked signals from one period's summary and its trends.
///
/// Pure function of its inputs: recomputed fresh every run, deterministic
/// ordering within each kind (ranking key, then service name). Without a
/// trend report only the trend-free concentration signals are derived.
pub fn derive(
    summary: &PeriodSummary,
    trends: Option<&TrendReport>,
    thresholds: &Thresholds,
) -> Vec<Signal> {
    let mut signals = concentration_signals(summary, thresholds);
    if let Some(report) = trends {
        signals.extend(spike_signals(report, thresholds));
        signals.extend(watchlist_signals(report, thresholds));
    }
    signals
}

fn concentration_signals(summary: &PeriodSummary, thresholds: &Thresholds) -> Vec<Signal> {
    let mut heavy: Vec<_> = summary
        .services
        .iter()
        .filter(|s| s.percentage_of_total >= thresholds.concentration_warn)
        .collect();
    heavy.sort_by(|a, b| {
        b.percentage_of_total
            .total_cmp(&a.percentage_of_total)
            .then_with(|| a.service.cmp(&b.service))
    });

    heavy
        .into_iter()
        .map(|s| {
            let severity = if s.percentage_of_total >= thresholds.concentration_high {
                Severity::High
            } else {
                Severity::Warn
            };
            Signal {
                kind: SignalKind::ConcentrationRisk,
                severity,
                service: s.service.clone(),
                title: format!(
                    "Concentration risk: {} is {:.1}% of spend",
                    s.service, s.percentage_of_total
                ),
                evidence: SignalEvidence {
                    percentage_of_total: Some(s.percentage_of_total),
                    total_cost: Some(s.total_cost),
                    ..Default::default()
                },
                action: format!(
                    "Review {} usage and pricing; a single service this dominant is a budget risk",
                    s.service
                ),
            }
        })
        .collect()
}

fn spike_signals(report: &TrendReport, thresholds: &Thresholds) -> Vec<Signal> {
    let mut movers: Vec<_> = report
        .by_service
        .iter()
        .filter(|(_, t)| t.direction == TrendDirection::Up)
        .collect();
    movers.sort_by(|(a_name, a), (b_name, b)| {
        b.absolute_change
            .cmp(&a.absolute_change)
            .then_with(|| a_name.cmp(b_name))
    });
    movers.truncate(thresholds.spike_top_k);

    movers
        .into_iter()
        .map(|(name, t)| Signal {
            kind: SignalKind::SpendSpike,
            severity: Severity::Warn,
            service: name.clone(),
            title: format!(
                "Spend spike driver: {} up {} period over period",
                name,
                if t.is_new {
                    "from zero".to_string()
                } else {
                    format!("{:.1}%", t.percentage_change)
                }
            ),
            evidence: SignalEvidence {
                trend_percentage: Some(t.percentage_change),
                trend_amount: Some(t.absolute_change),
                ..Default::default()
            },
            action: format!("Investigate what drove the recent increase in {} spend", name),
        })
        .collect()
}

fn watchlist_signals(report: &TrendReport, thresholds: &Thresholds) -> Vec<Signal> {
    let mut rising: Vec<_> = report
        .by_service
        .iter()
        .filter(|(_, t)| {
            t.direction == TrendDirection::Up
                && !t.is_new
                && t.percentage_change >= thresholds.watch_floor_pct
                && t.percentage_change < thresholds.spike_pct
        })
        .collect();
    rising.sort_by(|(a_name, a), (b_name, b)| {
        b.percentage_change
            .total_cmp(&a.percentage_change)
            .then_with(|| a_name.cmp(b_name))
    });

    rising
        .into_iter()
        .map(|(name, t)| Signal {
            kind: SignalKind::RisingWatchlist,
            severity: Severity::Info,
            service: name.clone(),
            title: format!(
                "Rising watchlist: {} up {:.1}%, notable but not yet alarming",
                name, t.percentage_change
            ),
            evidence: SignalEvidence {
                trend_percentage: Some(t.percentage_change),
                trend_amount: Some(t.absolute_change),
                ..Default::default()
            },
            action: format!("Keep an eye on {}; spend is trending up", name),
        })
        .collect()
}

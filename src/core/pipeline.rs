use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::aggregate::aggregate;
use crate::core::cache::{CacheStats, CostCache};
use crate::core::config::AppConfig;
use crate::core::fingerprint::{Granularity, GroupBy, Query};
use crate::core::models::signal::Signal;
use crate::core::models::summary::PeriodSummary;
use crate::core::models::trend::TrendReport;
use crate::core::signal;
use crate::core::source::CostSource;
use crate::core::trend;
use crate::core::window::Window;

/// Per-service deltas in a comparison are bounded to keep output readable.
const SERVICE_DELTA_LIMIT: usize = 50;

/// One period's decision-ready result: the rollup, trends against a
/// baseline when one was given, and the derived signals.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub summary: PeriodSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendReport>,
    pub signals: Vec<Signal>,
    pub from_cache: bool,
}

#[derive(Debug, Serialize)]
pub struct ServiceDelta {
    pub service: String,
    pub current_cost: Decimal,
    pub baseline_cost: Decimal,
    pub delta: Decimal,
    pub delta_percentage: f64,
}

/// Month-vs-month (or window-vs-window) comparison.
#[derive(Debug, Serialize)]
pub struct Comparison {
    pub current: PeriodSummary,
    pub baseline: PeriodSummary,
    pub trend: TrendReport,
    pub deltas: Vec<ServiceDelta>,
    pub signals: Vec<Signal>,
}

/// The aggregation pipeline: fingerprint -> cache -> fetch -> aggregate ->
/// trend -> signals. Owns the cache for the duration of one run; callers
/// open it, use it, and flush it on exit — never a hidden singleton.
pub struct Pipeline {
    config: AppConfig,
    cache: CostCache,
    source: CostSource,
}

impl Pipeline {
    pub fn new(config: AppConfig, cache: CostCache, source: CostSource) -> Self {
        Self {
            config,
            cache,
            source,
        }
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let source = CostSource::from_config(&config)?;
        Ok(Self::new(config, CostCache::open_default(), source))
    }

    /// Pipeline for cache maintenance: opens the cache but never fetches,
    /// so no source credentials are required.
    pub fn maintenance(config: AppConfig) -> Self {
        Self::new(config, CostCache::open_default(), CostSource::offline())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetch (through the cache) and aggregate one window.
    async fn summarize(
        &mut self,
        window: Window,
        filters: &[(String, String)],
        granularity: Granularity,
        group_by: GroupBy,
        force_refresh: bool,
    ) -> Result<(PeriodSummary, bool)> {
        let mut query = Query::new(window, granularity, group_by);
        for (key, value) in filters {
            query = query.with_filter(key, value);
        }

        let source = &self.source;
        let lookup = self
            .cache
            .get_or_fetch(&query, self.config.cache.ttl_seconds, force_refresh, || {
                source.fetch(&query)
            })
            .await?;
        Ok((aggregate(&lookup.items, window), lookup.hit))
    }

    /// Compute the decision-ready overview for `window`, optionally
    /// compared against `baseline`.
    pub async fn compute_overview(
        &mut self,
        window: Window,
        baseline: Option<Window>,
        filters: &[(String, String)],
        granularity: Granularity,
        group_by: GroupBy,
        force_refresh: bool,
    ) -> Result<Overview> {
        let (summary, from_cache) = self
            .summarize(window, filters, granularity, group_by, force_refresh)
            .await?;

        let (trend, signals) = match baseline {
            Some(baseline_window) => {
                let (baseline_summary, _) = self
                    .summarize(baseline_window, filters, granularity, group_by, force_refresh)
                    .await?;
                let report =
                    trend::compare(&summary, &baseline_summary, self.config.thresholds.stable_pct);
                let signals = signal::derive(&summary, Some(&report), &self.config.thresholds);
                (Some(report), signals)
            }
            None => (None, signal::derive(&summary, None, &self.config.thresholds)),
        };

        Ok(Overview {
            summary,
            trend,
            signals,
            from_cache,
        })
    }

    /// Compare two windows service by service, ranked by |delta|.
    pub async fn compare_windows(
        &mut self,
        current: Window,
        baseline: Window,
        force_refresh: bool,
    ) -> Result<Comparison> {
        let (current_summary, _) = self
            .summarize(current, &[], Granularity::Daily, GroupBy::Service, force_refresh)
            .await?;
        let (baseline_summary, _) = self
            .summarize(baseline, &[], Granularity::Daily, GroupBy::Service, force_refresh)
            .await?;

        let report = trend::compare(
            &current_summary,
            &baseline_summary,
            self.config.thresholds.stable_pct,
        );
        let signals = signal::derive(&current_summary, Some(&report), &self.config.thresholds);

        let current_costs: std::collections::BTreeMap<&str, Decimal> = current_summary
            .services
            .iter()
            .map(|s| (s.service.as_str(), s.total_cost))
            .collect();
        let baseline_costs: std::collections::BTreeMap<&str, Decimal> = baseline_summary
            .services
            .iter()
            .map(|s| (s.service.as_str(), s.total_cost))
            .collect();

        let mut deltas: Vec<ServiceDelta> = report
            .by_service
            .keys()
            .map(|name| {
                let cur = current_costs.get(name.as_str()).copied().unwrap_or(Decimal::ZERO);
                let base = baseline_costs
                    .get(name.as_str())
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let delta = cur - base;
                let delta_percentage = if base > Decimal::ZERO {
                    ((delta / base) * Decimal::from(100)).to_f64().unwrap_or(0.0)
                } else if cur > Decimal::ZERO {
                    100.0
                } else {
                    0.0
                };
                ServiceDelta {
                    service: name.clone(),
                    current_cost: cur,
                    baseline_cost: base,
                    delta,
                    delta_percentage,
                }
            })
            .collect();
        deltas.sort_by(|a, b| {
            b.delta
                .abs()
                .cmp(&a.delta.abs())
                .then_with(|| a.service.cmp(&b.service))
        });
        deltas.truncate(SERVICE_DELTA_LIMIT);

        Ok(Comparison {
            current: current_summary,
            baseline: baseline_summary,
            trend: report,
            deltas,
            signals,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Persist cache state. Called once at the end of a run.
    pub fn flush(&self) -> Result<()> {
        self.cache.save()
    }
}

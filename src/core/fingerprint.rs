use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::error::ValidationError;
use crate::core::window::Window;

/// Time bucket size the billing source groups raw records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => Err(ValidationError::UnsupportedGranularity(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

/// Dimension raw records are grouped by. A closed set: anything outside it
/// fails validation before the cache or the fetcher is ever reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Service,
}

impl GroupBy {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "service" => Ok(Self::Service),
            other => Err(ValidationError::UnsupportedGroupBy(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
        }
    }
}

/// Deterministic identity of a cost query, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully validated cost query: window, granularity, group-by dimension
/// and a set of filters. Two logically identical queries always produce
/// the same fingerprint, regardless of filter insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub window: Window,
    pub granularity: Granularity,
    pub group_by: GroupBy,
    pub filters: Vec<(String, String)>,
}

impl Query {
    pub fn new(window: Window, granularity: Granularity, group_by: GroupBy) -> Self {
        Self {
            window,
            granularity,
            group_by,
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.filters.push((key.to_string(), value.to_string()));
        self
    }

    /// Filters with keys sorted and casing normalized, so semantically
    /// equal requests collide in the cache.
    pub fn canonical_filters(&self) -> Vec<(String, String)> {
        let mut filters: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| {
                (
                    k.trim().to_lowercase(),
                    v.trim().to_lowercase(),
                )
            })
            .collect();
        filters.sort();
        filters
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let filters: Vec<String> = self
            .canonical_filters()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let content = format!(
            "{}|{}|{}|{}|{}",
            self.window.start,
            self.window.end,
            self.granularity.as_str(),
            self.group_by.as_str(),
            filters.join(";")
        );
        let digest = Sha256::digest(content.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Fingerprint(hex[..16].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> Window {
        Window::new(
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn group_by_rejects_unknown_dimension() {
        assert!(matches!(
            GroupBy::parse("LINKED_ACCOUNT"),
            Err(ValidationError::UnsupportedGroupBy(_))
        ));
        assert_eq!(GroupBy::parse(" Service ").unwrap(), GroupBy::Service);
    }

    #[test]
    fn granularity_parses_known_values() {
        assert_eq!(Granularity::parse("DAILY").unwrap(), Granularity::Daily);
        assert!(Granularity::parse("hourly").is_err());
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let q = Query::new(window(), Granularity::Daily, GroupBy::Service);
        assert_eq!(q.fingerprint(), q.fingerprint());
        assert_eq!(q.fingerprint().as_str().len(), 16);
    }

    #[test]
    fn fingerprint_ignores_filter_order_and_casing() {
        let a = Query::new(window(), Granularity::Daily, GroupBy::Service)
            .with_filter("env", "Prod")
            .with_filter("team", "Platform");
        let b = Query::new(window(), Granularity::Daily, GroupBy::Service)
            .with_filter("team", "platform ")
            .with_filter("env", "prod");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_any_dimension() {
        let base = Query::new(window(), Granularity::Daily, GroupBy::Service);
        let other_window = Query::new(
            Window::new(
                NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            )
            .unwrap(),
            Granularity::Daily,
            GroupBy::Service,
        );
        let monthly = Query::new(window(), Granularity::Monthly, GroupBy::Service);
        let filtered = base.clone().with_filter("env", "prod");

        assert_ne!(base.fingerprint(), other_window.fingerprint());
        assert_ne!(base.fingerprint(), monthly.fingerprint());
        assert_ne!(base.fingerprint(), filtered.fingerprint());
    }
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied to every cached fetch, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

fn default_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// "demo" for the offline deterministic source, "http" for a real
    /// billing endpoint.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Billing API endpoint, required in http mode. Must be HTTPS.
    pub endpoint: Option<String>,
    /// Environment variable holding the bearer token for http mode.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_mode() -> String {
    "demo".to_string()
}
fn default_api_key_env() -> String {
    "COSTLENS_API_TOKEN".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            endpoint: None,
            api_key_env: default_api_key_env(),
        }
    }
}

/// Trend and signal thresholds. Configuration constants, never hardwired
/// per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Dead band around zero movement; within it a trend reads "stable".
    #[serde(default = "default_stable_pct")]
    pub stable_pct: f64,
    /// Share of total spend at which a service becomes a concentration risk.
    #[serde(default = "default_concentration_warn")]
    pub concentration_warn: f64,
    /// Share at which the concentration signal escalates to high severity.
    #[serde(default = "default_concentration_high")]
    pub concentration_high: f64,
    /// How many upward movers make the spend-spike list.
    #[serde(default = "default_spike_top_k")]
    pub spike_top_k: usize,
    /// Lower bound of the rising-watchlist percentage band.
    #[serde(default = "default_watch_floor_pct")]
    pub watch_floor_pct: f64,
    /// Upper bound of the watchlist band; growth beyond it is spike
    /// territory rather than a watch item.
    #[serde(default = "default_spike_pct")]
    pub spike_pct: f64,
}

fn default_stable_pct() -> f64 {
    1.0
}
fn default_concentration_warn() -> f64 {
    40.0
}
fn default_concentration_high() -> f64 {
    50.0
}
fn default_spike_top_k() -> usize {
    3
}
fn default_watch_floor_pct() -> f64 {
    5.0
}
fn default_spike_pct() -> f64 {
    10.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stable_pct: default_stable_pct(),
            concentration_warn: default_concentration_warn(),
            concentration_high: default_concentration_high(),
            spike_top_k: default_spike_top_k(),
            watch_floor_pct: default_watch_floor_pct(),
            spike_pct: default_spike_pct(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_days")]
    pub default_days: i64,
    /// How many services the overview table shows; the summary itself
    /// keeps all of them.
    #[serde(default = "default_top_services")]
    pub top_services: usize,
}

fn default_days() -> i64 {
    30
}
fn default_top_services() -> usize {
    10
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            top_services: default_top_services(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Commented template written by `costlens config init`.
pub const DEFAULT_CONFIG: &str = r#"# costlens configuration

[cache]
# How long a fetched payload stays valid, in seconds.
ttl_seconds = 3600

[source]
# "demo" generates deterministic offline data; "http" talks to a real
# billing endpoint.
mode = "demo"
# endpoint = "https://billing.example.com/v1/costs"
api_key_env = "COSTLENS_API_TOKEN"

[thresholds]
stable_pct = 1.0
concentration_warn = 40.0
concentration_high = 50.0
spike_top_k = 3
watch_floor_pct = 5.0
spike_pct = 10.0

[output]
default_days = 30
top_services = 10
"#;

impl AppConfig {
    /// Config file path, respecting XDG_CONFIG_HOME.
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("costlens").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        match self.source.mode.as_str() {
            "demo" => {}
            "http" => match self.source.endpoint.as_deref() {
                None => return invalid("source.endpoint is required in http mode".into()),
                Some(url) if !url.starts_with("https://") => {
                    return invalid(format!("source.endpoint must use HTTPS, got: {}", url))
                }
                Some(_) => {}
            },
            other => return invalid(format!("unknown source.mode '{}'", other)),
        }
        if self.cache.ttl_seconds == 0 {
            return invalid("cache.ttl_seconds must be positive".into());
        }
        let t = &self.thresholds;
        for (name, value) in [
            ("stable_pct", t.stable_pct),
            ("concentration_warn", t.concentration_warn),
            ("concentration_high", t.concentration_high),
            ("watch_floor_pct", t.watch_floor_pct),
            ("spike_pct", t.spike_pct),
        ] {
            if value < 0.0 {
                return invalid(format!("thresholds.{} must not be negative", name));
            }
        }
        if t.concentration_high < t.concentration_warn {
            return invalid("thresholds.concentration_high must be >= concentration_warn".into());
        }
        if !(1..=365).contains(&self.output.default_days) {
            return invalid("output.default_days must be between 1 and 365".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_to_default_config() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.cache.ttl_seconds, 3600);
        assert_eq!(parsed.source.mode, "demo");
        assert_eq!(parsed.thresholds.concentration_warn, 40.0);
        assert_eq!(parsed.output.default_days, 30);
    }

    #[test]
    fn empty_file_uses_all_defaults() {
        let parsed: AppConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.cache.ttl_seconds, 3600);
        assert_eq!(parsed.thresholds.spike_top_k, 3);
        assert_eq!(parsed.output.top_services, 10);
    }

    #[test]
    fn http_mode_requires_https_endpoint() {
        let config: AppConfig = toml::from_str(
            r#"
            [source]
            mode = "http"
            endpoint = "http://billing.example.com"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config: AppConfig = toml::from_str(
            r#"
            [source]
            mode = "http"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config: AppConfig = toml::from_str(
            r#"
            [source]
            mode = "http"
            endpoint = "https://billing.example.com"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [source]
            mode = "csv"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn inverted_concentration_thresholds_are_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [thresholds]
            concentration_warn = 60.0
            concentration_high = 50.0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}

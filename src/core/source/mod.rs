pub mod demo;
pub mod http;

use anyhow::Result;

use crate::core::config::AppConfig;
use crate::core::error::FetchError;
use crate::core::fingerprint::Query;
use crate::core::models::summary::RawLineItem;
use demo::DemoCostSource;
use http::HttpCostSource;

/// The billing data source behind the cache. The core treats it as a pure
/// function of the query: it either returns a payload or fails, never a
/// partial result. Retry and timeout policy live here, not in the core.
#[derive(Debug)]
pub enum CostSource {
    Http(HttpCostSource),
    Demo(DemoCostSource),
}

impl CostSource {
    /// Build the source the config asks for. Assumes a validated config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.source.mode.as_str() {
            "http" => {
                let endpoint = config
                    .source
                    .endpoint
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("source.endpoint is required in http mode"))?;
                let api_key = std::env::var(&config.source.api_key_env).map_err(|_| {
                    anyhow::anyhow!(
                        "environment variable {} is not set",
                        config.source.api_key_env
                    )
                })?;
                Ok(Self::Http(HttpCostSource::new(endpoint, api_key)?))
            }
            _ => Ok(Self::Demo(DemoCostSource::new())),
        }
    }

    /// Deterministic offline source; also stands in where a pipeline is
    /// built for cache maintenance and will never fetch.
    pub fn offline() -> Self {
        Self::Demo(DemoCostSource::new())
    }

    pub async fn fetch(&self, query: &Query) -> Result<Vec<RawLineItem>, FetchError> {
        match self {
            Self::Http(source) => source.fetch(query).await,
            Self::Demo(source) => Ok(source.fetch(query)),
        }
    }
}

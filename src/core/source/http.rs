use std::str::FromStr;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::error::FetchError;
use crate::core::fingerprint::Query;
use crate::core::models::summary::RawLineItem;

#[derive(Deserialize)]
struct WireLineItem {
    service: String,
    date: String,
    /// Decimal amount as a string; parsed exactly, never through a float.
    amount: String,
    currency: Option<String>,
}

/// Billing API client: one GET per query against a configured endpoint
/// with bearer auth. Every call costs money, which is why the cache in
/// front of this is the core invariant of the tool.
#[derive(Debug)]
pub struct HttpCostSource {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

/// Endpoint overrides must use HTTPS before we send credentials anywhere.
pub fn validate_endpoint(url: &str) -> Result<()> {
    if !url.starts_with("https://") {
        anyhow::bail!("billing endpoint must use HTTPS, got: {}", url);
    }
    Ok(())
}

impl HttpCostSource {
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        validate_endpoint(&endpoint)?;
        Ok(Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    pub async fn fetch(&self, query: &Query) -> Result<Vec<RawLineItem>, FetchError> {
        let mut params: Vec<(String, String)> = vec![
            ("start".into(), query.window.start.to_string()),
            ("end".into(), query.window.end.to_string()),
            ("granularity".into(), query.granularity.as_str().into()),
            ("group_by".into(), query.group_by.as_str().into()),
        ];
        params.extend(query.canonical_filters());

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return Err(FetchError::Unauthorized)
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::Throttled),
            reqwest::StatusCode::NOT_FOUND => return Err(FetchError::NotAvailable),
            s if !s.is_success() => {
                return Err(FetchError::Network(format!(
                    "HTTP {} from billing endpoint",
                    s.as_u16()
                )))
            }
            _ => {}
        }

        let wire: Vec<WireLineItem> = response
            .json()
            .await
            .map_err(|e| FetchError::Network(format!("invalid response body: {}", e)))?;

        wire.into_iter().map(parse_line_item).collect()
    }
}

fn parse_line_item(raw: WireLineItem) -> Result<RawLineItem, FetchError> {
    let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d")
        .map_err(|_| FetchError::Network(format!("invalid date in response: {}", raw.date)))?;
    let amount = Decimal::from_str(&raw.amount)
        .map_err(|_| FetchError::Network(format!("invalid amount in response: {}", raw.amount)))?;
    Ok(RawLineItem {
        service: raw.service,
        date,
        amount,
        currency: raw.currency.unwrap_or_else(|| "USD".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_endpoint_accepts_https() {
        assert!(validate_endpoint("https://billing.example.com/v1/costs").is_ok());
    }

    #[test]
    fn validate_endpoint_rejects_http_and_other_schemes() {
        assert!(validate_endpoint("http://billing.example.com").is_err());
        assert!(validate_endpoint("file:///etc/passwd").is_err());
        assert!(validate_endpoint("billing.example.com").is_err());
        assert!(validate_endpoint("").is_err());
    }

    #[test]
    fn new_refuses_plain_http_endpoint() {
        assert!(HttpCostSource::new("http://x".into(), "token".into()).is_err());
    }

    #[test]
    fn wire_items_parse_exact_decimals() {
        let raw = WireLineItem {
            service: "Amazon EC2".into(),
            date: "2026-08-15".into(),
            amount: "123.456789".into(),
            currency: None,
        };
        let item = parse_line_item(raw).unwrap();
        assert_eq!(item.amount, Decimal::from_str("123.456789").unwrap());
        assert_eq!(item.currency, "USD");
    }

    #[test]
    fn malformed_amount_is_a_fetch_error() {
        let raw = WireLineItem {
            service: "Amazon EC2".into(),
            date: "2026-08-15".into(),
            amount: "12,50".into(),
            currency: Some("USD".into()),
        };
        assert!(matches!(
            parse_line_item(raw),
            Err(FetchError::Network(_))
        ));
    }

    #[test]
    fn deserialize_wire_response() {
        let json = r#"[
            {"service": "Amazon S3", "date": "2026-08-01", "amount": "0.0042", "currency": "USD"}
        ]"#;
        let wire: Vec<WireLineItem> = serde_json::from_str(json).unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].amount, "0.0042");
    }
}

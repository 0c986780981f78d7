use chrono::NaiveDate;
use thiserror::Error;

/// Input validation failures. Surfaced immediately, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
    #[error("unsupported group-by dimension '{0}' (supported: service)")]
    UnsupportedGroupBy(String),
    #[error("unsupported granularity '{0}' (supported: daily, monthly)")]
    UnsupportedGranularity(String),
    #[error("days must be between 1 and 365, got {0}")]
    InvalidDays(i64),
    #[error("month must be 1..=12, got {0}")]
    InvalidMonth(u32),
    #[error("invalid month label '{0}' (expected YYYY-MM)")]
    InvalidMonthLabel(String),
}

/// Failures from the billing data source. The core passes these through
/// unchanged; it never retries and never caches a failed fetch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("billing API throttled the request")]
    Throttled,
    #[error("billing API rejected the credentials")]
    Unauthorized,
    #[error("cost data is not available for the requested window")]
    NotAvailable,
    #[error("network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_are_distinguishable() {
        let errors = [
            FetchError::Throttled,
            FetchError::Unauthorized,
            FetchError::NotAvailable,
            FetchError::Network("connection reset".into()),
        ];
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn validation_error_names_the_bad_dimension() {
        let err = ValidationError::UnsupportedGroupBy("REGION".into());
        assert!(err.to_string().contains("REGION"));
    }
}

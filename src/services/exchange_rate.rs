use crate::constants::{EXCHANGE_RATE_SOURCE, EXCHANGE_RATE_URL};
use crate::error::{Error, Result};
use crate::models::ExchangeRate;
use crate::services::http::get_json;
use crate::services::sources::RateSource;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

pub struct ExchangeRateClient {
    url: String,
    client: reqwest::Client,
}

impl ExchangeRateClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            url: EXCHANGE_RATE_URL.to_string(),
            client,
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn usd_to_vnd(&self) -> Result<ExchangeRate> {
        let json = get_json(self.client.get(&self.url), "exchange-rate")
            .await
            .map_err(|e| Error::RateUnavailable(e.to_string()))?;
        let rate = parse_vnd_rate(&json)?;
        Ok(ExchangeRate::live_usd_vnd(rate, EXCHANGE_RATE_SOURCE))
    }
}

/// Read `rates.VND` from a `/latest/USD` payload
pub fn parse_vnd_rate(json: &Value) -> Result<f64> {
    let rate = json
        .get("rates")
        .and_then(|rates| rates.get("VND"))
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::RateUnavailable("rates.VND missing from response".to_string()))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::RateUnavailable(format!("implausible USD/VND rate {}", rate)));
    }

    Ok(rate)
}

/// Live rate if available, otherwise the flagged fallback constant
pub async fn resolve_usd_vnd(source: &dyn RateSource, fallback: f64) -> ExchangeRate {
    match source.usd_to_vnd().await {
        Ok(rate) => {
            info!(rate = rate.rate, source = %rate.source, "Fetched USD/VND rate");
            rate
        }
        Err(e) => {
            warn!(error = %e, fallback, "USD/VND rate unavailable, using fallback rate");
            ExchangeRate::fallback_usd_vnd(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedRate(Option<f64>);

    #[async_trait]
    impl RateSource for FixedRate {
        async fn usd_to_vnd(&self) -> Result<ExchangeRate> {
            self.0
                .map(|r| ExchangeRate::live_usd_vnd(r, "test"))
                .ok_or_else(|| Error::RateUnavailable("offline".into()))
        }
    }

    #[test]
    fn test_parse_vnd_rate() {
        let payload = json!({"base": "USD", "rates": {"USD": 1, "VND": 25410.5}});
        assert_eq!(parse_vnd_rate(&payload).unwrap(), 25410.5);
    }

    #[test]
    fn test_parse_vnd_rate_missing() {
        assert!(parse_vnd_rate(&json!({"rates": {"EUR": 0.92}})).is_err());
        assert!(parse_vnd_rate(&json!({"result": "error"})).is_err());
        assert!(parse_vnd_rate(&json!({"rates": {"VND": 0}})).is_err());
    }

    #[tokio::test]
    async fn test_resolve_uses_live_rate() {
        let rate = resolve_usd_vnd(&FixedRate(Some(25_000.0)), 24_000.0).await;
        assert_eq!(rate.rate, 25_000.0);
        assert!(!rate.is_fallback);
    }

    #[tokio::test]
    async fn test_resolve_falls_back() {
        let rate = resolve_usd_vnd(&FixedRate(None), 24_000.0).await;
        assert_eq!(rate.rate, 24_000.0);
        assert!(rate.is_fallback);
    }
}

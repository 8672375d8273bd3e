//! Yahoo Finance chart API client
//!
//! Only `chart.result[0].meta` is read: the latest market price, the previous
//! close, the market time and the currency.

use crate::constants::YAHOO_CHART_URL;
use crate::error::{Error, Result};
use crate::models::{PriceChange, Quote};
use crate::services::http::get_json;
use crate::services::sources::QuoteSource;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

pub struct YahooChartClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, YAHOO_CHART_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl QuoteSource for YahooChartClient {
    async fn fetch_quote(&self, symbol: &str, name: &str) -> Result<Quote> {
        let url = format!("{}/{}", self.base_url, symbol);
        debug!(symbol, url = %url, "Fetching quote");

        let json = get_json(self.client.get(&url), "yahoo").await?;
        parse_chart(&json, symbol, name, Utc::now().timestamp())
    }
}

/// Parse a chart payload into a quote
///
/// A missing market price falls back to the previous close. Either price
/// missing leaves the change unavailable. When neither price is
/// present the payload carries no quote at all.
pub fn parse_chart(json: &Value, symbol: &str, name: &str, fetched_at: i64) -> Result<Quote> {
    let meta = json
        .get("chart")
        .and_then(|c| c.get("result"))
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(|result| result.get("meta"))
        .ok_or_else(|| {
            Error::MalformedResponse(format!("yahoo: no chart result for {}", symbol))
        })?;

    let market_price = meta.get("regularMarketPrice").and_then(Value::as_f64);
    let previous_close = meta
        .get("previousClose")
        .or_else(|| meta.get("chartPreviousClose"))
        .and_then(Value::as_f64);

    let current_price = market_price.or(previous_close).ok_or_else(|| {
        Error::MalformedResponse(format!("yahoo: no price fields for {}", symbol))
    })?;

    let market_time = meta
        .get("regularMarketTime")
        .and_then(Value::as_i64)
        .unwrap_or(fetched_at);

    let currency = meta
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or("USD");

    let previous_close = previous_close.unwrap_or(0.0);
    // a stand-in current price says nothing about the move
    let change = match market_price {
        Some(price) => PriceChange::between(price, previous_close),
        None => PriceChange::UNAVAILABLE,
    };

    Ok(Quote::with_change(
        symbol,
        name,
        current_price,
        previous_close,
        change,
        currency,
        market_time,
    ))
}

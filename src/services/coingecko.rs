//! CoinGecko market listing client
//!
//! Fetches the top cryptocurrencies by market capitalization from
//! `/coins/markets` and attaches the Yahoo symbol each coin is quoted under.

use crate::constants::COINGECKO_BASE_URL;
use crate::error::{Error, Result};
use crate::models::CoinListing;
use crate::services::http::get_json;
use crate::services::sources::MarketListSource;
use crate::services::symbol_map::to_yahoo_symbol;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct CoinGeckoClient {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, COINGECKO_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl MarketListSource for CoinGeckoClient {
    async fn top_coins(&self, limit: usize) -> Result<Vec<CoinListing>> {
        let url = format!("{}/coins/markets", self.base_url);
        let per_page = limit.to_string();

        debug!(url = %url, limit, "Fetching market listing");

        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("sparkline", "false"),
            ]);

        let json = get_json(request, "coingecko").await?;
        let coins = parse_markets(&json)?;

        info!(count = coins.len(), "Fetched market listing");
        Ok(coins)
    }
}

/// Parse a `/coins/markets` payload
///
/// The payload must be an array; entries missing `id`, `symbol` or `name`
/// are skipped rather than failing the whole listing.
pub fn parse_markets(json: &Value) -> Result<Vec<CoinListing>> {
    let entries = json.as_array().ok_or_else(|| {
        Error::MalformedResponse("coingecko: expected an array of coins".to_string())
    })?;

    let mut coins = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse_coin(entry) {
            Some(coin) => coins.push(coin),
            None => warn!(entry = %entry, "Skipping malformed market listing entry"),
        }
    }

    Ok(coins)
}

fn parse_coin(entry: &Value) -> Option<CoinListing> {
    let id = entry.get("id")?.as_str()?;
    let symbol = entry.get("symbol")?.as_str()?;
    let name = entry.get("name")?.as_str()?;

    if symbol.trim().is_empty() {
        return None;
    }

    Some(CoinListing {
        id: id.to_string(),
        symbol: symbol.to_uppercase(),
        name: name.to_string(),
        rank: entry
            .get("market_cap_rank")
            .and_then(Value::as_u64)
            .and_then(|r| u32::try_from(r).ok()),
        market_cap: entry.get("market_cap").and_then(Value::as_f64),
        total_volume: entry.get("total_volume").and_then(Value::as_f64),
        quote_symbol: to_yahoo_symbol(symbol),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_markets() {
        let payload = json!([
            {
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "market_cap_rank": 1,
                "market_cap": 1.28e12,
                "total_volume": 3.1e10
            },
            {
                "id": "tether",
                "symbol": "usdt",
                "name": "Tether",
                "market_cap_rank": 3,
                "market_cap": null
            }
        ]);

        let coins = parse_markets(&payload).unwrap();
        assert_eq!(coins.len(), 2);

        assert_eq!(coins[0].symbol, "BTC");
        assert_eq!(coins[0].quote_symbol, "BTC-USD");
        assert_eq!(coins[0].rank, Some(1));
        assert_eq!(coins[0].market_cap, Some(1.28e12));

        assert_eq!(coins[1].quote_symbol, "USDT-USD");
        assert_eq!(coins[1].market_cap, None);
        assert_eq!(coins[1].total_volume, None);
    }

    #[test]
    fn test_parse_markets_skips_incomplete_entries() {
        let payload = json!([
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "market_cap_rank": 1},
            {"id": "mystery", "name": "No Symbol"},
            {"symbol": "eth", "name": "Ethereum"}
        ]);

        let coins = parse_markets(&payload).unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "bitcoin");
    }

    #[test]
    fn test_parse_markets_rejects_non_array() {
        let payload = json!({"status": {"error_code": 429}});
        assert!(matches!(
            parse_markets(&payload),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_null_rank() {
        let payload = json!([{"id": "x", "symbol": "x", "name": "X", "market_cap_rank": null}]);
        let coins = parse_markets(&payload).unwrap();
        assert_eq!(coins[0].rank, None);
    }
}

//! Seams between the orchestrators and the upstream sources
//!
//! Each adapter performs one bounded-time fetch and returns a populated record
//! or an error the orchestrator downgrades to "no data".

use crate::error::Result;
use crate::models::{CoinListing, ExchangeRate, LeaderboardDate, Listing, Quote};
use async_trait::async_trait;

/// Market-cap ranked coin listing
#[async_trait]
pub trait MarketListSource: Send + Sync {
    async fn top_coins(&self, limit: usize) -> Result<Vec<CoinListing>>;
}

/// Latest quote for one instrument symbol
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str, name: &str) -> Result<Quote>;
}

/// Live USD/VND rate
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn usd_to_vnd(&self) -> Result<ExchangeRate>;
}

/// Ranked listings for one leaderboard day
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn fetch_listings(&self, date: LeaderboardDate, limit: usize) -> Result<Vec<Listing>>;
}

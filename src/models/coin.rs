//! Cryptocurrency market listing entries
//!
//! One entry per coin from the market-cap ranked listing. The Yahoo symbol is
//! attached at fetch time so later stages can join quotes back to coins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinListing {
    /// Listing-side identifier (e.g. "bitcoin")
    pub id: String,
    /// Uppercased ticker (e.g. "BTC")
    pub symbol: String,
    pub name: String,
    pub rank: Option<u32>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    /// Symbol used against the quote source (e.g. "BTC-USD")
    pub quote_symbol: String,
}

/// Sort key that places unranked coins last
pub fn rank_key(rank: Option<u32>) -> u32 {
    rank.unwrap_or(u32::MAX)
}

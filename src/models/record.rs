//! Canonical records produced by the normalizer

use crate::models::{DualPrice, Quote};
use serde::{Deserialize, Serialize};

/// A ranked cryptocurrency quote enriched with listing data and the USD/VND rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoRecord {
    pub rank: Option<u32>,
    pub name: String,
    pub symbol: String,
    pub coingecko_id: String,
    pub quote_symbol: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub change_available: bool,
    pub currency: String,
    pub market_time: i64,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub price: DualPrice,
    pub change_vnd: Option<f64>,
    pub usd_to_vnd_rate: Option<f64>,
}

/// A stock index or commodity quote with its document key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    /// Key inside the category document (e.g. "SP500", "GOLD")
    pub key: String,
    #[serde(flatten)]
    pub quote: Quote,
    pub price: DualPrice,
    pub previous_close_price: DualPrice,
}

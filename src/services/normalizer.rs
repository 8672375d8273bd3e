//! Pure reshaping of adapter output into canonical records
//!
//! Nothing here performs I/O; the same inputs always give the same records.

use crate::models::{
    rank_key, CoinListing, CryptoRecord, DualPrice, ExchangeRate, InstrumentRecord, Listing, Quote,
};
use std::collections::{HashMap, HashSet};

/// USD value with its VND counterpart; VND stays absent without a rate
pub fn dual_price(usd: f64, rate: Option<&ExchangeRate>) -> DualPrice {
    DualPrice {
        usd,
        vnd: rate.map(|r| r.convert(usd)),
    }
}

/// Drop listing entries whose quote symbol was already seen, keeping the first
pub fn dedup_coins(coins: Vec<CoinListing>) -> Vec<CoinListing> {
    let mut seen = HashSet::new();
    coins
        .into_iter()
        .filter(|coin| seen.insert(coin.quote_symbol.clone()))
        .collect()
}

/// Join quotes with their listing entries, ordered by market-cap rank
///
/// Coins without a quote are left out. Ties keep listing order. At most one
/// record per quote symbol, the best ranked one.
pub fn normalize_crypto(
    coins: &[CoinListing],
    quotes: &[Quote],
    rate: Option<&ExchangeRate>,
) -> Vec<CryptoRecord> {
    let by_symbol: HashMap<&str, &Quote> = quotes.iter().map(|q| (q.symbol.as_str(), q)).collect();

    let mut records: Vec<CryptoRecord> = coins
        .iter()
        .filter_map(|coin| {
            by_symbol
                .get(coin.quote_symbol.as_str())
                .map(|quote| crypto_record(coin, quote, rate))
        })
        .collect();

    // stable: equal ranks keep their relative order
    records.sort_by_key(|r| rank_key(r.rank));
    let mut seen = HashSet::new();
    records.retain(|r| seen.insert(r.quote_symbol.clone()));
    records
}

fn crypto_record(coin: &CoinListing, quote: &Quote, rate: Option<&ExchangeRate>) -> CryptoRecord {
    CryptoRecord {
        rank: coin.rank,
        name: coin.name.clone(),
        symbol: coin.symbol.clone(),
        coingecko_id: coin.id.clone(),
        quote_symbol: coin.quote_symbol.clone(),
        current_price: quote.current_price,
        previous_close: quote.previous_close,
        change: quote.change,
        change_percent: quote.change_percent,
        change_available: quote.change_available,
        currency: quote.currency.clone(),
        market_time: quote.market_time,
        market_cap: coin.market_cap,
        total_volume: coin.total_volume,
        price: dual_price(quote.current_price, rate),
        change_vnd: if quote.change_available {
            rate.map(|r| r.convert(quote.change))
        } else {
            None
        },
        usd_to_vnd_rate: rate.map(|r| r.rate),
    }
}

/// Wrap an index or commodity quote with its document key and dual prices
pub fn normalize_instrument(key: &str, quote: Quote, rate: Option<&ExchangeRate>) -> InstrumentRecord {
    InstrumentRecord {
        key: key.to_string(),
        price: dual_price(quote.current_price, rate),
        previous_close_price: dual_price(quote.previous_close, rate),
        quote,
    }
}

/// Drop title-less listings and order the rest by rank (stable)
pub fn finalize_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut valid: Vec<Listing> = listings.into_iter().filter(Listing::has_title).collect();
    valid.sort_by_key(|l| l.rank);
    valid
}

use crate::constants::{
    DEFAULT_CLEAR_BATCH_SIZE, DEFAULT_FETCH_CONCURRENCY, DEFAULT_TOP_COINS, FALLBACK_USD_VND_RATE,
    LEADERBOARD_COLLECTION, LEADERBOARD_ITEM_LIMIT, MARKET_COLLECTION, REQUEST_TIMEOUT_SECS,
};
use crate::models::LeaderboardDate;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one market snapshot run
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Number of top coins requested from the market listing
    pub top_coins: usize,

    /// Target collection for the snapshot
    pub collection: String,

    /// Documents deleted per round when clearing the collection
    pub clear_batch_size: usize,

    /// Concurrent quote fetches (1 = sequential)
    pub concurrency: usize,

    /// Upper bound for one source call
    pub fetch_timeout: Duration,

    /// USD/VND rate substituted when the live rate is unavailable
    pub fallback_usd_vnd: f64,

    /// Where to write the JSON backup, if anywhere
    pub backup_dir: Option<PathBuf>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            top_coins: DEFAULT_TOP_COINS,
            collection: MARKET_COLLECTION.to_string(),
            clear_batch_size: DEFAULT_CLEAR_BATCH_SIZE,
            concurrency: DEFAULT_FETCH_CONCURRENCY,
            fetch_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            fallback_usd_vnd: FALLBACK_USD_VND_RATE,
            backup_dir: None,
        }
    }
}

impl MarketConfig {
    /// Clamp values that would make a run meaningless
    pub fn normalized(mut self) -> Self {
        self.top_coins = self.top_coins.clamp(1, 250);
        self.clear_batch_size = self.clear_batch_size.max(1);
        self.concurrency = self.concurrency.max(1);
        self
    }
}

/// Configuration for one leaderboard snapshot run
#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    /// Day to fetch; `None` means yesterday in local time
    pub date: Option<LeaderboardDate>,

    pub collection: String,

    pub clear_batch_size: usize,

    /// Items considered from the top of the page
    pub item_limit: usize,

    pub backup_dir: Option<PathBuf>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            date: None,
            collection: LEADERBOARD_COLLECTION.to_string(),
            clear_batch_size: DEFAULT_CLEAR_BATCH_SIZE,
            item_limit: LEADERBOARD_ITEM_LIMIT,
            backup_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_config_default() {
        let config = MarketConfig::default();
        assert_eq!(config.top_coins, 10);
        assert_eq!(config.collection, "crypto & finance");
        assert_eq!(config.clear_batch_size, 500);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.fallback_usd_vnd, 24000.0);
    }

    #[test]
    fn test_market_config_normalized() {
        let config = MarketConfig {
            top_coins: 0,
            clear_batch_size: 0,
            concurrency: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.top_coins, 1);
        assert_eq!(config.clear_batch_size, 1);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_leaderboard_config_default() {
        let config = LeaderboardConfig::default();
        assert_eq!(config.collection, "producthunt");
        assert_eq!(config.item_limit, 20);
        assert!(config.date.is_none());
    }
}

pub mod backup;
pub mod coingecko;
pub mod document_store;
pub mod exchange_rate;
pub mod fetch_pool;
pub mod firestore;
pub mod http;
pub mod leaderboard;
pub mod leaderboard_sync;
pub mod market_sync;
pub mod normalizer;
pub mod replacer;
pub mod run_context;
pub mod sources;
pub mod symbol_map;
pub mod yahoo;

pub use coingecko::CoinGeckoClient;
pub use document_store::{DocumentStore, InMemoryStore};
pub use exchange_rate::{resolve_usd_vnd, ExchangeRateClient};
pub use fetch_pool::{fetch_quotes, QuoteRequest};
pub use firestore::FirestoreStore;
pub use leaderboard::LeaderboardClient;
pub use leaderboard_sync::{LeaderboardSync, LEADERBOARD_JOB};
pub use market_sync::{MarketReport, MarketSources, MarketSync, MARKET_JOB};
pub use replacer::{ClearStats, CollectionReplacer};
pub use run_context::RunContext;
pub use sources::{LeaderboardSource, MarketListSource, QuoteSource, RateSource};
pub use yahoo::YahooChartClient;

mod coin;
mod exchange_rate;
mod job_config;
mod listing;
mod quote;
mod record;
mod run_state;
pub mod snapshot;

pub use coin::{rank_key, CoinListing};
pub use exchange_rate::ExchangeRate;
pub use job_config::{LeaderboardConfig, MarketConfig};
pub use listing::{LeaderboardDate, Listing, PLACEHOLDER};
pub use quote::{DualPrice, PriceChange, Quote};
pub use record::{CryptoRecord, InstrumentRecord};
pub use run_state::{ReplaceOutcome, RunState, RunSummary};
pub use snapshot::{CollectionSnapshot, Document, StoredDocument};

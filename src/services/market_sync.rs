//! Market snapshot run
//!
//! Resolves the USD/VND rate and the top coins, quotes every instrument on a
//! bounded pool, normalizes, and replaces the market collection with five
//! documents: `exchange_rates`, `cryptocurrencies`, `stock_indices`,
//! `commodities` and `market_overview`.

use crate::constants::{COMMODITIES, STOCK_INDICES};
use crate::error::{Error, Result};
use crate::models::{
    CoinListing, CollectionSnapshot, CryptoRecord, Document, ExchangeRate, InstrumentRecord,
    MarketConfig, Quote, RunState, RunSummary,
};
use crate::services::backup;
use crate::services::coingecko::CoinGeckoClient;
use crate::services::exchange_rate::{resolve_usd_vnd, ExchangeRateClient};
use crate::services::fetch_pool::{fetch_quotes, QuoteRequest};
use crate::services::http::build_client_with_timeout;
use crate::services::normalizer::{dedup_coins, normalize_crypto, normalize_instrument};
use crate::services::run_context::RunContext;
use crate::services::sources::{MarketListSource, QuoteSource, RateSource};
use crate::services::yahoo::YahooChartClient;
use crate::utils::get_service_account_key;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const MARKET_JOB: &str = "market";

const QUOTE_SOURCE_NAME: &str = "Yahoo Finance";
const LISTING_SOURCE_NAME: &str = "CoinGecko";

/// Upstream adapters for one market run
pub struct MarketSources {
    pub listing: Arc<dyn MarketListSource>,
    pub quotes: Arc<dyn QuoteSource>,
    pub rates: Arc<dyn RateSource>,
}

impl MarketSources {
    pub fn live(client: reqwest::Client) -> Self {
        Self {
            listing: Arc::new(CoinGeckoClient::new(client.clone())),
            quotes: Arc::new(YahooChartClient::new(client.clone())),
            rates: Arc::new(ExchangeRateClient::new(client)),
        }
    }
}

/// Normalized output of a market run
#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub generated_at: DateTime<Utc>,
    pub exchange_rate: ExchangeRate,
    /// Ordered by market-cap rank
    pub crypto: Vec<CryptoRecord>,
    pub indices: Vec<InstrumentRecord>,
    pub commodities: Vec<InstrumentRecord>,
    /// Listed coins that got no quote
    pub missing: Vec<String>,
}

impl MarketReport {
    pub fn total_records(&self) -> usize {
        self.crypto.len() + self.indices.len() + self.commodities.len()
    }

    /// Documents for the market collection; empty categories are left out
    pub fn to_snapshot(&self, collection: &str) -> Result<CollectionSnapshot> {
        let rate = &self.exchange_rate;
        let mut documents = Vec::with_capacity(5);

        documents.push(document(
            "exchange_rates",
            json!({
                "usd_to_vnd": rate.rate,
                "currency_pair": rate.pair(),
                "source": rate.source,
                "is_fallback": rate.is_fallback,
            }),
        )?);

        if !self.crypto.is_empty() {
            let mut data = Map::new();
            for record in &self.crypto {
                data.insert(record.quote_symbol.clone(), serde_json::to_value(record)?);
            }
            let ranking: Vec<&str> = self.crypto.iter().map(|r| r.quote_symbol.as_str()).collect();
            documents.push(document(
                "cryptocurrencies",
                json!({
                    "data": data,
                    "ranking": ranking,
                    "total_coins": self.crypto.len(),
                    "source": format!("{} + {}", QUOTE_SOURCE_NAME, LISTING_SOURCE_NAME),
                    "usd_to_vnd_rate": rate.rate,
                }),
            )?);
        }

        if !self.indices.is_empty() {
            documents.push(instrument_document("stock_indices", "total_indices", &self.indices, rate)?);
        }
        if !self.commodities.is_empty() {
            documents.push(instrument_document("commodities", "total_commodities", &self.commodities, rate)?);
        }

        documents.push(document(
            "market_overview",
            json!({
                "crypto_count": self.crypto.len(),
                "stock_indices_count": self.indices.len(),
                "commodities_count": self.commodities.len(),
                "total_records": self.total_records(),
                "usd_to_vnd_rate": rate.rate,
                "rate_is_fallback": rate.is_fallback,
                "generated_at": self.generated_at.to_rfc3339(),
                "data_sources": {
                    "crypto": format!("{} + {}", QUOTE_SOURCE_NAME, LISTING_SOURCE_NAME),
                    "stock_indices": QUOTE_SOURCE_NAME,
                    "commodities": QUOTE_SOURCE_NAME,
                    "exchange_rate": rate.source,
                },
            }),
        )?);

        Ok(CollectionSnapshot::new(collection, documents))
    }

    /// Body of the JSON backup file
    pub fn backup_payload(&self) -> Value {
        json!({
            "generated_at": self.generated_at.to_rfc3339(),
            "total_records": self.total_records(),
            "exchange_rate": self.exchange_rate,
            "crypto": self.crypto,
            "stock_indices": self.indices,
            "commodities": self.commodities,
        })
    }
}

fn document(id: &str, body: Value) -> Result<Document> {
    Document::from_serializable(Some(id.to_string()), &body)
}

fn instrument_document(
    id: &str,
    count_field: &str,
    records: &[InstrumentRecord],
    rate: &ExchangeRate,
) -> Result<Document> {
    let mut data = Map::new();
    for record in records {
        data.insert(record.key.clone(), serde_json::to_value(record)?);
    }

    let mut body = Map::new();
    body.insert("data".to_string(), Value::Object(data));
    body.insert(count_field.to_string(), json!(records.len()));
    body.insert("source".to_string(), json!(QUOTE_SOURCE_NAME));
    body.insert("usd_to_vnd_rate".to_string(), json!(rate.rate));
    Ok(Document::with_id(id, body))
}

/// Orchestrates one market snapshot
pub struct MarketSync {
    config: MarketConfig,
    sources: MarketSources,
}

impl MarketSync {
    pub fn new(config: MarketConfig, sources: MarketSources) -> Self {
        Self {
            config: config.normalized(),
            sources,
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Run against the live sources, persisting when `persist` and a key is configured
    pub async fn run_live(config: MarketConfig, persist: bool) -> Result<(RunSummary, Option<MarketReport>)> {
        let client = build_client_with_timeout(config.fetch_timeout)?;
        let ctx = if persist {
            RunContext::connect(client.clone(), get_service_account_key().as_deref()).await
        } else {
            RunContext::offline()
        };
        let sync = Self::new(config, MarketSources::live(client));
        Ok(sync.run(&ctx).await)
    }

    /// Run once. Never panics or exits; the outcome is in the summary.
    #[instrument(skip(self, ctx), fields(run_id = %ctx.run_id, collection = %self.config.collection))]
    pub async fn run(&self, ctx: &RunContext) -> (RunSummary, Option<MarketReport>) {
        let mut summary = RunSummary::new(MARKET_JOB);
        summary.advance(RunState::Fetching);

        let (rate, coins) = tokio::join!(
            resolve_usd_vnd(self.sources.rates.as_ref(), self.config.fallback_usd_vnd),
            self.fetch_listing()
        );
        summary.exchange_rate = Some(rate.clone());
        let listed = coins.len();
        let coins = dedup_coins(coins);
        if coins.len() < listed {
            warn!(dropped = listed - coins.len(), "Listing repeats quote symbols, keeping the first of each");
        }
        summary.record_fetched("coins", coins.len());

        if coins.is_empty() {
            let e = Error::EmptyResultSet("market listing returned no coins".to_string());
            error!(error = %e, "Aborting market run before any write");
            summary.fail(e);
            return (summary, None);
        }

        let requests = quote_requests(&coins);
        let quotes = fetch_quotes(
            Arc::clone(&self.sources.quotes),
            &requests,
            self.config.concurrency,
            self.config.fetch_timeout,
        )
        .await;

        summary.advance(RunState::Normalizing);
        let report = build_report(&coins, quotes, rate);
        summary.record_fetched("crypto", report.crypto.len());
        summary.record_fetched("stock_indices", report.indices.len());
        summary.record_fetched("commodities", report.commodities.len());
        if !report.missing.is_empty() {
            warn!(missing = ?report.missing, "Some listed coins have no quote");
        }

        self.persist(ctx, &report, &mut summary).await;
        self.write_backup(&report, &mut summary);

        info!(
            state = summary.state.as_str(),
            written = summary.written,
            records = report.total_records(),
            fallback_rate = summary.used_fallback_rate(),
            "Market run finished"
        );
        (summary, Some(report))
    }

    async fn fetch_listing(&self) -> Vec<CoinListing> {
        let fetch = self.sources.listing.top_coins(self.config.top_coins);
        match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(coins)) => {
                info!(count = coins.len(), "Fetched market listing");
                coins
            }
            Ok(Err(e)) if e.is_recoverable() => {
                warn!(error = %e, "Market listing unavailable");
                Vec::new()
            }
            Ok(Err(e)) => {
                error!(error = %e, "Market listing failed");
                Vec::new()
            }
            Err(_) => {
                warn!("Market listing timed out");
                Vec::new()
            }
        }
    }

    async fn persist(&self, ctx: &RunContext, report: &MarketReport, summary: &mut RunSummary) {
        let snapshot = match report.to_snapshot(&self.config.collection) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to build market snapshot");
                summary.fail(e);
                return;
            }
        };

        if !ctx.has_store() {
            info!(documents = snapshot.len(), "Persistence disabled, skipping replace");
            summary.advance(RunState::Done);
            return;
        }

        summary.advance(RunState::Replacing);
        if let Some(outcome) = ctx.replace(&snapshot, self.config.clear_batch_size).await {
            summary.written = outcome.written;
            summary.persisted = true;
            summary.replace = Some(outcome);
        }
        summary.advance(RunState::Done);
    }

    fn write_backup(&self, report: &MarketReport, summary: &mut RunSummary) {
        let Some(dir) = &self.config.backup_dir else {
            return;
        };
        let file_name = backup::market_file_name(report.generated_at);
        match backup::write_json(dir, &file_name, &report.backup_payload()) {
            Ok(path) => summary.backup_path = Some(path.display().to_string()),
            Err(e) => warn!(error = %e, "Market backup failed"),
        }
    }
}

/// Coins first, then indices, then commodities
fn quote_requests(coins: &[CoinListing]) -> Vec<QuoteRequest> {
    let mut requests: Vec<QuoteRequest> = coins
        .iter()
        .map(|c| QuoteRequest::new(&c.quote_symbol, &c.name))
        .collect();
    requests.extend(STOCK_INDICES.iter().map(|(_, symbol, name)| QuoteRequest::new(*symbol, *name)));
    requests.extend(COMMODITIES.iter().map(|(_, symbol, _, name)| QuoteRequest::new(*symbol, *name)));
    requests
}

/// Split quotes back along `quote_requests` order and normalize each category
fn build_report(coins: &[CoinListing], quotes: Vec<Option<Quote>>, rate: ExchangeRate) -> MarketReport {
    let mut quotes = quotes.into_iter();
    let coin_quotes: Vec<Option<Quote>> = quotes.by_ref().take(coins.len()).collect();
    let index_quotes: Vec<Option<Quote>> = quotes.by_ref().take(STOCK_INDICES.len()).collect();
    let commodity_quotes: Vec<Option<Quote>> = quotes.collect();

    let missing = coins
        .iter()
        .zip(&coin_quotes)
        .filter(|(_, q)| q.is_none())
        .map(|(c, _)| c.symbol.clone())
        .collect();

    let fetched: Vec<Quote> = coin_quotes.into_iter().flatten().collect();
    let crypto = normalize_crypto(coins, &fetched, Some(&rate));

    let indices = STOCK_INDICES
        .iter()
        .zip(index_quotes)
        .filter_map(|((key, _, _), quote)| quote.map(|q| normalize_instrument(key, q, Some(&rate))))
        .collect();

    let commodities = COMMODITIES
        .iter()
        .zip(commodity_quotes)
        .filter_map(|((key, _, published, _), quote)| {
            quote.map(|mut q| {
                q.symbol = published.to_string();
                normalize_instrument(key, q, Some(&rate))
            })
        })
        .collect();

    MarketReport {
        generated_at: Utc::now(),
        exchange_rate: rate,
        crypto,
        indices,
        commodities,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::document_store::{DocumentStore, InMemoryStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FakeListing(Vec<CoinListing>);

    #[async_trait]
    impl MarketListSource for FakeListing {
        async fn top_coins(&self, limit: usize) -> Result<Vec<CoinListing>> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    /// Quotes by symbol; unknown symbols fail, "SLOW" never answers in time
    struct FakeQuotes(HashMap<String, (f64, f64)>);

    #[async_trait]
    impl QuoteSource for FakeQuotes {
        async fn fetch_quote(&self, symbol: &str, name: &str) -> Result<Quote> {
            if symbol.starts_with("SLOW") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            match self.0.get(symbol) {
                Some((current, previous)) => Ok(Quote::new(symbol, name, *current, *previous, "USD", 1_700_000_000)),
                None => Err(Error::MalformedResponse(format!("no price for {}", symbol))),
            }
        }
    }

    struct FakeRate(Option<f64>);

    #[async_trait]
    impl RateSource for FakeRate {
        async fn usd_to_vnd(&self) -> Result<ExchangeRate> {
            self.0
                .map(|r| ExchangeRate::live_usd_vnd(r, "test"))
                .ok_or_else(|| Error::RateUnavailable("down".to_string()))
        }
    }

    fn coin(symbol: &str, rank: u32) -> CoinListing {
        CoinListing {
            id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            name: format!("{} coin", symbol),
            rank: Some(rank),
            market_cap: Some(1e9),
            total_volume: Some(1e6),
            quote_symbol: format!("{}-USD", symbol),
        }
    }

    fn all_instruments() -> HashMap<String, (f64, f64)> {
        let mut quotes = HashMap::new();
        quotes.insert("BTC-USD".to_string(), (65000.0, 64000.0));
        quotes.insert("ETH-USD".to_string(), (3000.0, 3100.0));
        quotes.insert("^GSPC".to_string(), (5000.0, 4950.0));
        quotes.insert("^NDX".to_string(), (18000.0, 17900.0));
        quotes.insert("^IXIC".to_string(), (16000.0, 15800.0));
        quotes.insert("GC=F".to_string(), (2300.0, 2290.0));
        quotes
    }

    fn sync(coins: Vec<CoinListing>, quotes: HashMap<String, (f64, f64)>, rate: Option<f64>) -> MarketSync {
        let config = MarketConfig {
            fetch_timeout: Duration::from_millis(300),
            ..Default::default()
        };
        MarketSync::new(
            config,
            MarketSources {
                listing: Arc::new(FakeListing(coins)),
                quotes: Arc::new(FakeQuotes(quotes)),
                rates: Arc::new(FakeRate(rate)),
            },
        )
    }

    fn context(store: &Arc<InMemoryStore>) -> RunContext {
        RunContext::new(Some(Arc::clone(store) as Arc<dyn DocumentStore>))
    }

    #[tokio::test]
    async fn test_market_run_replaces_collection() {
        let store = Arc::new(InMemoryStore::new());
        store.seed("crypto & finance", 30).await;

        let job = sync(vec![coin("BTC", 1), coin("ETH", 2)], all_instruments(), Some(24000.0));
        let (summary, report) = job.run(&context(&store)).await;

        assert!(summary.is_success());
        assert!(summary.is_consistent());
        assert!(summary.persisted);
        assert_eq!(summary.written, 5);
        assert_eq!(report.unwrap().total_records(), 6);

        let ids: Vec<String> = store
            .list_documents("crypto & finance")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(
            ids,
            vec!["commodities", "cryptocurrencies", "exchange_rates", "market_overview", "stock_indices"]
        );

        let crypto = store.get("crypto & finance", "cryptocurrencies").await.unwrap();
        let btc = &crypto["data"]["BTC-USD"];
        assert_eq!(btc["change"].as_f64(), Some(1000.0));
        assert_eq!(btc["change_percent"].as_f64(), Some(1.5625));
        assert_eq!(btc["price"]["vnd"].as_f64(), Some(1_560_000_000.0));
        assert_eq!(crypto["total_coins"], 2);
        assert_eq!(crypto["ranking"], json!(["BTC-USD", "ETH-USD"]));

        let commodities = store.get("crypto & finance", "commodities").await.unwrap();
        assert_eq!(commodities["data"]["GOLD"]["symbol"], "XAU/USD");
        assert_eq!(commodities["data"]["GOLD"]["name"], "Spot Gold");

        let overview = store.get("crypto & finance", "market_overview").await.unwrap();
        assert_eq!(overview["rate_is_fallback"], false);
        assert_eq!(overview["crypto_count"], 2);
        assert!(overview.contains_key("timestamp"));
        assert!(overview.contains_key("last_updated"));
    }

    #[tokio::test]
    async fn test_empty_listing_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        store.seed("crypto & finance", 3).await;

        let job = sync(Vec::new(), all_instruments(), Some(24000.0));
        let (summary, report) = job.run(&context(&store)).await;

        assert_eq!(summary.state, RunState::Error);
        assert!(summary.error.as_deref().unwrap_or_default().contains("Empty result set"));
        assert!(report.is_none());
        assert_eq!(summary.written, 0);
        assert_eq!(store.count("crypto & finance").await, 3);
        assert_eq!(store.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_failure_uses_flagged_fallback() {
        let store = Arc::new(InMemoryStore::new());
        let job = sync(vec![coin("BTC", 1)], all_instruments(), None);
        let (summary, _) = job.run(&context(&store)).await;

        assert!(summary.is_success());
        assert!(summary.used_fallback_rate());

        let rates = store.get("crypto & finance", "exchange_rates").await.unwrap();
        assert_eq!(rates["is_fallback"], true);
        assert_eq!(rates["usd_to_vnd"].as_f64(), Some(24000.0));

        let overview = store.get("crypto & finance", "market_overview").await.unwrap();
        assert_eq!(overview["rate_is_fallback"], true);
    }

    #[tokio::test]
    async fn test_failed_and_slow_quotes_are_omitted() {
        let mut quotes = all_instruments();
        quotes.remove("ETH-USD");
        quotes.remove("^GSPC");
        quotes.remove("^NDX");
        quotes.remove("^IXIC");
        quotes.insert("SLOW-USD".to_string(), (1.0, 1.0));

        let store = Arc::new(InMemoryStore::new());
        let job = sync(vec![coin("BTC", 1), coin("ETH", 2), coin("SLOW", 3)], quotes, Some(24000.0));
        let (summary, report) = job.run(&context(&store)).await;
        let report = report.unwrap();

        assert!(summary.is_success());
        assert_eq!(report.crypto.len(), 1);
        assert_eq!(report.missing, vec!["ETH", "SLOW"]);
        assert!(report.indices.is_empty());
        // no stock_indices document
        assert_eq!(summary.written, 4);
        assert!(store.get("crypto & finance", "stock_indices").await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_quote_symbol_counted_once() {
        let mut wrapped = coin("WBTC", 9);
        wrapped.quote_symbol = "BTC-USD".to_string();

        let job = sync(vec![coin("BTC", 1), coin("ETH", 2), wrapped], all_instruments(), Some(24000.0));
        let (summary, report) = job.run(&RunContext::offline()).await;
        let report = report.unwrap();

        assert!(summary.is_success());
        assert_eq!(report.crypto.len(), 2);

        let snapshot = report.to_snapshot("crypto & finance").unwrap();
        let crypto = snapshot
            .documents
            .iter()
            .find(|d| d.id.as_deref() == Some("cryptocurrencies"))
            .unwrap();
        assert_eq!(crypto.fields["total_coins"], 2);
        assert_eq!(crypto.fields["data"].as_object().unwrap().len(), 2);
        assert_eq!(crypto.fields["data"]["BTC-USD"]["symbol"], "BTC");
    }

    #[tokio::test]
    async fn test_offline_run_computes_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let config = MarketConfig {
            backup_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let job = MarketSync::new(
            config,
            MarketSources {
                listing: Arc::new(FakeListing(vec![coin("BTC", 1)])),
                quotes: Arc::new(FakeQuotes(all_instruments())),
                rates: Arc::new(FakeRate(Some(24000.0))),
            },
        );

        let (summary, report) = job.run(&RunContext::offline()).await;
        assert!(summary.is_success());
        assert!(!summary.persisted);
        assert!(summary.replace.is_none());
        assert_eq!(report.unwrap().crypto[0].price.vnd, Some(1_560_000_000.0));

        let backup_path = summary.backup_path.unwrap();
        assert!(std::path::Path::new(&backup_path).exists());
    }

    #[test]
    fn test_snapshot_omits_empty_categories() {
        let report = MarketReport {
            generated_at: Utc::now(),
            exchange_rate: ExchangeRate::fallback_usd_vnd(24000.0),
            crypto: Vec::new(),
            indices: Vec::new(),
            commodities: Vec::new(),
            missing: Vec::new(),
        };
        let snapshot = report.to_snapshot("c").unwrap();
        let ids: Vec<&str> = snapshot.documents.iter().filter_map(|d| d.id.as_deref()).collect();
        assert_eq!(ids, vec!["exchange_rates", "market_overview"]);
    }
}

use crate::error::{Error, Result};
use crate::models::{
    CollectionSnapshot, Document, LeaderboardConfig, LeaderboardDate, Listing, RunState, RunSummary,
};
use crate::services::backup;
use crate::services::http::build_client;
use crate::services::leaderboard::LeaderboardClient;
use crate::services::normalizer::finalize_listings;
use crate::services::run_context::RunContext;
use crate::services::sources::LeaderboardSource;
use crate::utils::{get_service_account_key, now_local};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const LEADERBOARD_JOB: &str = "leaderboard";

/// Orchestrates one leaderboard snapshot
pub struct LeaderboardSync {
    config: LeaderboardConfig,
    source: Arc<dyn LeaderboardSource>,
}

impl LeaderboardSync {
    pub fn new(config: LeaderboardConfig, source: Arc<dyn LeaderboardSource>) -> Self {
        Self { config, source }
    }

    pub fn live(config: LeaderboardConfig, client: reqwest::Client) -> Self {
        Self::new(config, Arc::new(LeaderboardClient::new(client)))
    }

    /// Configured date, or yesterday in local time
    pub fn target_date(&self) -> LeaderboardDate {
        self.config
            .date
            .unwrap_or_else(|| LeaderboardDate::yesterday(&now_local()))
    }

    /// Run against the live page, persisting when `persist` and a key is configured
    pub async fn run_live(config: LeaderboardConfig, persist: bool) -> Result<(RunSummary, Vec<Listing>)> {
        let client = build_client()?;
        let ctx = if persist {
            RunContext::connect(client.clone(), get_service_account_key().as_deref()).await
        } else {
            RunContext::offline()
        };
        Ok(Self::live(config, client).run(&ctx).await)
    }

    #[instrument(skip(self, ctx), fields(run_id = %ctx.run_id, collection = %self.config.collection))]
    pub async fn run(&self, ctx: &RunContext) -> (RunSummary, Vec<Listing>) {
        let mut summary = RunSummary::new(LEADERBOARD_JOB);
        let date = self.target_date();
        summary.advance(RunState::Fetching);

        let listings = match self.source.fetch_listings(date, self.config.item_limit).await {
            Ok(listings) => listings,
            Err(e) if e.is_recoverable() => {
                warn!(date = %date, error = %e, "Leaderboard unavailable");
                Vec::new()
            }
            Err(e) => {
                error!(date = %date, error = %e, "Leaderboard fetch failed");
                Vec::new()
            }
        };
        summary.record_fetched("products", listings.len());

        summary.advance(RunState::Normalizing);
        let listings = finalize_listings(listings);
        if listings.is_empty() {
            let e = Error::EmptyResultSet(format!("no leaderboard products for {}", date));
            error!(error = %e, "Aborting leaderboard run before any write");
            summary.fail(e);
            return (summary, listings);
        }

        let snapshot = match snapshot(&self.config.collection, &listings) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to build leaderboard snapshot");
                summary.fail(e);
                return (summary, listings);
            }
        };

        if ctx.has_store() {
            summary.advance(RunState::Replacing);
            if let Some(outcome) = ctx.replace(&snapshot, self.config.clear_batch_size).await {
                summary.written = outcome.written;
                summary.persisted = true;
                summary.replace = Some(outcome);
            }
        } else {
            info!(documents = snapshot.len(), "Persistence disabled, skipping replace");
        }
        summary.advance(RunState::Done);

        if let Some(dir) = &self.config.backup_dir {
            let payload = backup::leaderboard_payload(date, &listings, Utc::now());
            match backup::write_json(dir, &backup::leaderboard_file_name(date), &payload) {
                Ok(path) => summary.backup_path = Some(path.display().to_string()),
                Err(e) => warn!(error = %e, "Leaderboard backup failed"),
            }
        }

        info!(date = %date, products = listings.len(), written = summary.written, "Leaderboard run finished");
        (summary, listings)
    }
}

/// One document per listing, ids left to the store
fn snapshot(collection: &str, listings: &[Listing]) -> Result<CollectionSnapshot> {
    let documents = listings
        .iter()
        .map(|listing| Document::from_serializable(None, listing))
        .collect::<Result<Vec<_>>>()?;
    Ok(CollectionSnapshot::new(collection, documents))
}

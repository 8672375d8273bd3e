//! Bounded concurrent quote fetching
//!
//! Every request runs under its own timeout once it holds a worker slot, so a
//! slow source cannot hold up the others past that bound. Results come back
//! in request order after all requests have resolved.

use crate::models::Quote;
use crate::services::sources::QuoteSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// One instrument to quote
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub symbol: String,
    pub name: String,
}

impl QuoteRequest {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Fetch all requests with at most `concurrency` in flight; failures become `None`
pub async fn fetch_quotes(
    source: Arc<dyn QuoteSource>,
    requests: &[QuoteRequest],
    concurrency: usize,
    timeout: Duration,
) -> Vec<Option<Quote>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (idx, request) in requests.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = tokio::time::timeout(timeout, source.fetch_quote(&request.symbol, &request.name)).await;
            (idx, request, result)
        });
    }

    let mut results: Vec<Option<Quote>> = vec![None; requests.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, request, Ok(Ok(quote)))) => {
                debug!(symbol = %request.symbol, price = quote.current_price, "Fetched quote");
                results[idx] = Some(quote);
            }
            Ok((_, request, Ok(Err(e)))) => {
                warn!(symbol = %request.symbol, error = %e, "No data for instrument");
            }
            Ok((_, request, Err(_))) => {
                warn!(symbol = %request.symbol, timeout_secs = timeout.as_secs_f64(), "Quote fetch timed out");
            }
            Err(e) => {
                warn!(error = %e, "Quote fetch task failed");
            }
        }
    }

    results
}

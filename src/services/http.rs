use crate::constants::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client shared by all source adapters of a run
pub fn build_client() -> Result<reqwest::Client> {
    build_client_with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
}

pub fn build_client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// GET a URL and return the body as text, mapping failures to `SourceUnavailable`
pub async fn get_text(request: reqwest::RequestBuilder, label: &str) -> Result<String> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::SourceUnavailable(format!("{}: request failed: {}", label, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::SourceUnavailable(format!(
            "{}: upstream returned status {}",
            label, status
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::SourceUnavailable(format!("{}: failed to read body: {}", label, e)))?;

    debug!(source = label, bytes = body.len(), "Fetched response body");
    Ok(body)
}

/// GET a URL and parse the body as JSON; an unparsable body is `MalformedResponse`
pub async fn get_json(request: reqwest::RequestBuilder, label: &str) -> Result<Value> {
    let body = get_text(request, label).await?;
    serde_json::from_str(&body)
        .map_err(|e| Error::MalformedResponse(format!("{}: invalid JSON: {}", label, e)))
}

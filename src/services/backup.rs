use crate::error::{Error, Result};
use crate::models::{LeaderboardDate, Listing};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write a pretty-printed JSON backup, creating the directory if needed
pub fn write_json<T: Serialize>(dir: &Path, file_name: &str, payload: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::Io(format!("Failed to create backup dir {}: {}", dir.display(), e)))?;

    let path = dir.join(file_name);
    let body = serde_json::to_string_pretty(payload)?;
    fs::write(&path, body)
        .map_err(|e| Error::Io(format!("Failed to write backup {}: {}", path.display(), e)))?;

    info!(path = %path.display(), "Wrote JSON backup");
    Ok(path)
}

pub fn leaderboard_file_name(date: LeaderboardDate) -> String {
    format!("producthunt_{}.json", date.file_stem())
}

pub fn market_file_name(at: DateTime<Utc>) -> String {
    format!("market_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Backup body for a leaderboard run
pub fn leaderboard_payload(date: LeaderboardDate, listings: &[Listing], scraped_at: DateTime<Utc>) -> Value {
    json!({
        "date": date.path_segment(),
        "scraped_at": scraped_at.to_rfc3339(),
        "total_products": listings.len(),
        "products": listings,
    })
}

use crate::constants::{FALLBACK_USD_VND_RATE, LOCAL_TIMEZONE};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;

/// Get backup directory from environment variable or use default
pub fn get_backup_dir() -> PathBuf {
    std::env::var("MARKETMIRROR_BACKUP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("backups"))
}

/// Service account JSON used to reach the document store, if configured
pub fn get_service_account_key() -> Option<String> {
    std::env::var("SERVICE_ACCOUNT_KEY")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Fallback USD/VND rate, overridable through `MARKETMIRROR_FALLBACK_USD_VND`
pub fn get_fallback_rate() -> Result<f64> {
    match std::env::var("MARKETMIRROR_FALLBACK_USD_VND") {
        Ok(raw) => parse_fallback_rate(&raw),
        Err(_) => Ok(FALLBACK_USD_VND_RATE),
    }
}

fn parse_fallback_rate(raw: &str) -> Result<f64> {
    let rate: f64 = raw.trim().parse().map_err(|_| {
        Error::Config(format!("MARKETMIRROR_FALLBACK_USD_VND is not a number: '{}'", raw))
    })?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::Config(format!(
            "MARKETMIRROR_FALLBACK_USD_VND must be positive, got {}",
            rate
        )));
    }
    Ok(rate)
}

/// Current time in the local market timezone
pub fn now_local() -> DateTime<Tz> {
    Utc::now().with_timezone(&LOCAL_TIMEZONE)
}

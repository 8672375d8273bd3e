use serde::{Deserialize, Serialize};

/// A single currency-pair conversion factor
///
/// `is_fallback` marks a substituted constant so downstream consumers can tell
/// it apart from a live quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base: String,
    pub quote: String,
    pub rate: f64,
    pub source: String,
    pub is_fallback: bool,
}

impl ExchangeRate {
    pub fn live_usd_vnd(rate: f64, source: impl Into<String>) -> Self {
        Self {
            base: "USD".to_string(),
            quote: "VND".to_string(),
            rate,
            source: source.into(),
            is_fallback: false,
        }
    }

    pub fn fallback_usd_vnd(rate: f64) -> Self {
        Self {
            base: "USD".to_string(),
            quote: "VND".to_string(),
            rate,
            source: "fallback".to_string(),
            is_fallback: true,
        }
    }

    /// "USD/VND"
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

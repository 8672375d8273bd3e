use serde::{Deserialize, Serialize};

/// A price observation for one instrument, as reported by a quote source
///
/// `change` and `change_percent` are only meaningful when `change_available`
/// is set; otherwise both are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub change_available: bool,
    pub currency: String,
    /// Observation time in epoch seconds
    pub market_time: i64,
}

impl Quote {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: f64,
        previous_close: f64,
        currency: impl Into<String>,
        market_time: i64,
    ) -> Self {
        let change = PriceChange::between(current_price, previous_close);
        Self::with_change(symbol, name, current_price, previous_close, change, currency, market_time)
    }

    /// Build a quote whose change was decided by the caller
    pub fn with_change(
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: f64,
        previous_close: f64,
        change: PriceChange,
        currency: impl Into<String>,
        market_time: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            current_price,
            previous_close,
            change: change.absolute,
            change_percent: change.percent,
            change_available: change.available,
            currency: currency.into(),
            market_time,
        }
    }
}

/// Absolute and percentage move from a previous close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub absolute: f64,
    pub percent: f64,
    pub available: bool,
}

impl PriceChange {
    pub const UNAVAILABLE: PriceChange = PriceChange {
        absolute: 0.0,
        percent: 0.0,
        available: false,
    };

    /// `(current - previous) / previous * 100`, undefined when previous is zero
    pub fn between(current: f64, previous: f64) -> Self {
        if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
            return Self::UNAVAILABLE;
        }
        let absolute = current - previous;
        Self {
            absolute,
            percent: absolute / previous * 100.0,
            available: true,
        }
    }
}

/// A USD amount with its VND counterpart when a rate is known
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualPrice {
    pub usd: f64,
    pub vnd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_change() {
        let quote = Quote::new("BTC-USD", "Bitcoin", 65000.0, 64000.0, "USD", 1_700_000_000);
        assert!(quote.change_available);
        assert_eq!(quote.change, 1000.0);
        assert!((quote.change_percent - 1.5625).abs() < 1e-9);
    }

    #[test]
    fn test_zero_previous_close_is_unavailable() {
        let quote = Quote::new("NEW-USD", "New Coin", 3.5, 0.0, "USD", 0);
        assert!(!quote.change_available);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn test_with_change_keeps_caller_decision() {
        let quote = Quote::with_change("GC=F", "Gold", 2300.0, 2300.0, PriceChange::UNAVAILABLE, "USD", 0);
        assert!(!quote.change_available);
        assert_eq!(quote.previous_close, 2300.0);
    }

    #[test]
    fn test_negative_change() {
        let change = PriceChange::between(90.0, 100.0);
        assert!(change.available);
        assert_eq!(change.absolute, -10.0);
        assert_eq!(change.percent, -10.0);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert_eq!(PriceChange::between(f64::NAN, 1.0), PriceChange::UNAVAILABLE);
        assert_eq!(PriceChange::between(1.0, f64::INFINITY), PriceChange::UNAVAILABLE);
    }
}

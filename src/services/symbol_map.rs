use crate::constants::{YAHOO_CRYPTO_SUFFIX, YAHOO_SYMBOL_MAP};

/// Map a crypto ticker to its Yahoo Finance symbol
///
/// Known tickers come from the lookup table (matched case-insensitively);
/// anything else becomes `{TICKER}-USD`. An empty ticker still maps to a
/// non-empty symbol.
pub fn to_yahoo_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let lower = trimmed.to_lowercase();

    if let Some((_, mapped)) = YAHOO_SYMBOL_MAP.iter().find(|(key, _)| *key == lower) {
        return (*mapped).to_string();
    }

    format!("{}{}", trimmed.to_uppercase(), YAHOO_CRYPTO_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbols() {
        assert_eq!(to_yahoo_symbol("btc"), "BTC-USD");
        assert_eq!(to_yahoo_symbol("ETH"), "ETH-USD");
        assert_eq!(to_yahoo_symbol("Matic"), "MATIC-USD");
    }

    #[test]
    fn test_unknown_symbol_is_synthesized() {
        assert_eq!(to_yahoo_symbol("usdt"), "USDT-USD");
        assert_eq!(to_yahoo_symbol("steth"), "STETH-USD");
    }

    #[test]
    fn test_mapping_is_total() {
        for input in ["", " ", "a", "ünï", "x-y", "1000sats"] {
            let mapped = to_yahoo_symbol(input);
            assert!(!mapped.is_empty());
            assert!(mapped.ends_with("-USD"));
        }
    }
}

//! Source URLs, collection names and lookup tables
//!
//! ## Upstream sources
//!
//! | Source                | Used for                               |
//! |-----------------------|----------------------------------------|
//! | CoinGecko             | Top cryptocurrencies by market cap     |
//! | Yahoo Finance chart   | Quotes for crypto, indices, gold       |
//! | exchangerate-api.com  | USD/VND conversion rate                |
//! | Product Hunt          | Daily product leaderboard (HTML)       |

/// Per-request timeout for every outbound call
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Browser-like user agent; Yahoo and Product Hunt reject bare clients
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const EXCHANGE_RATE_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";
pub const EXCHANGE_RATE_SOURCE: &str = "exchangerate-api.com";
pub const LEADERBOARD_BASE_URL: &str = "https://www.producthunt.com";

/// Substitute USD/VND rate when the live rate cannot be fetched
pub const FALLBACK_USD_VND_RATE: f64 = 24000.0;

/// Number of top cryptocurrencies pulled from the market listing
pub const DEFAULT_TOP_COINS: usize = 10;

/// Documents deleted per enumeration round when clearing a collection
pub const DEFAULT_CLEAR_BATCH_SIZE: usize = 500;

/// Concurrent quote fetches
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Leaderboard items considered per page
pub const LEADERBOARD_ITEM_LIMIT: usize = 20;

pub const MARKET_COLLECTION: &str = "crypto & finance";
pub const LEADERBOARD_COLLECTION: &str = "producthunt";

/// Timezone the leaderboard day and the schedule are anchored to
pub const LOCAL_TIMEZONE: chrono_tz::Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// Local hours at which scheduled runs fire
pub const SCHEDULE_HOURS: &[u32] = &[6, 11, 16, 21];

/// Suffix appended to synthesized Yahoo crypto symbols
pub const YAHOO_CRYPTO_SUFFIX: &str = "-USD";

/// Known crypto symbol -> Yahoo Finance symbol
pub const YAHOO_SYMBOL_MAP: &[(&str, &str)] = &[
    ("btc", "BTC-USD"),
    ("eth", "ETH-USD"),
    ("bnb", "BNB-USD"),
    ("sol", "SOL-USD"),
    ("ada", "ADA-USD"),
    ("xrp", "XRP-USD"),
    ("dot", "DOT-USD"),
    ("doge", "DOGE-USD"),
    ("avax", "AVAX-USD"),
    ("link", "LINK-USD"),
    ("matic", "MATIC-USD"),
    ("ltc", "LTC-USD"),
    ("bch", "BCH-USD"),
    ("xlm", "XLM-USD"),
    ("vet", "VET-USD"),
    ("fil", "FIL-USD"),
    ("trx", "TRX-USD"),
    ("etc", "ETC-USD"),
    ("atom", "ATOM-USD"),
    ("icp", "ICP-USD"),
    ("uni", "UNI-USD"),
    ("algo", "ALGO-USD"),
    ("hbar", "HBAR-USD"),
    ("apt", "APT-USD"),
    ("near", "NEAR-USD"),
    ("op", "OP-USD"),
    ("arb", "ARB-USD"),
    ("ldo", "LDO-USD"),
    ("rpl", "RPL-USD"),
    ("mkr", "MKR-USD"),
];

/// Stock indices: (document key, Yahoo symbol, display name)
pub const STOCK_INDICES: &[(&str, &str, &str)] = &[
    ("SP500", "^GSPC", "S&P 500"),
    ("NASDAQ100", "^NDX", "NASDAQ-100"),
    ("NASDAQ_COMPOSITE", "^IXIC", "NASDAQ Composite"),
];

/// Commodities: (document key, Yahoo symbol, published symbol, display name)
pub const COMMODITIES: &[(&str, &str, &str, &str)] = &[("GOLD", "GC=F", "XAU/USD", "Spot Gold")];

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the payload of an [`Envelope`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Synthetic,
}

/// Client-facing `{ data: ... }` envelope returned by every adapter method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub source: Provenance,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn live(data: T) -> Self {
        Self { data, source: Provenance::Live, fetched_at: Utc::now() }
    }

    pub fn synthetic(data: T) -> Self {
        Self { data, source: Provenance::Synthetic, fetched_at: Utc::now() }
    }

    pub fn is_live(&self) -> bool {
        self.source == Provenance::Live
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope { data: f(self.data), source: self.source, fetched_at: self.fetched_at }
    }
}

/// Optional fundamentals attached to a quote. Every field is independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
}

/// Normalized equity quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub last_price: f64,
    pub net_change: f64,
    pub percentage_change: f64,
    #[serde(default)]
    pub day_high: Option<f64>,
    #[serde(default)]
    pub day_low: Option<f64>,
    #[serde(default)]
    pub week_52_high: Option<f64>,
    #[serde(default)]
    pub week_52_low: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub fundamentals: Fundamentals,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, last_price: f64, net_change: f64, percentage_change: f64) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            last_price,
            net_change,
            percentage_change,
            day_high: None,
            day_low: None,
            week_52_high: None,
            week_52_low: None,
            volume: None,
            fundamentals: Fundamentals::default(),
        }
    }
}

/// Index level (NIFTY 50, NIFTY BANK, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub name: String,
    pub last_price: f64,
    pub net_change: f64,
    pub percentage_change: f64,
}

/// Exchange open/closed flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub exchange: String,
    pub is_open: bool,
    #[serde(default)]
    pub raw_status: Option<String>,
}

/// OHLCV candle with optional open interest (derivatives)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

/// Candle interval accepted by the historical endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandleInterval {
    Minute1,
    Minute30,
    Day,
    Week,
    Month,
}

impl CandleInterval {
    pub fn as_path(&self) -> &'static str {
        match self {
            CandleInterval::Minute1 => "1minute",
            CandleInterval::Minute30 => "30minute",
            CandleInterval::Day => "day",
            CandleInterval::Week => "week",
            CandleInterval::Month => "month",
        }
    }

    pub fn to_minutes(&self) -> i64 {
        match self {
            CandleInterval::Minute1 => 1,
            CandleInterval::Minute30 => 30,
            CandleInterval::Day => 1440,
            CandleInterval::Week => 10080,
            CandleInterval::Month => 43200,
        }
    }
}

/// One side (CE or PE) of an option strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub ltp: f64,
    pub net_change: f64,
    pub percentage_change: f64,
    #[serde(default)]
    pub open_interest: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionStrike {
    pub strike: f64,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub call: Option<OptionLeg>,
    #[serde(default)]
    pub put: Option<OptionLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsChain {
    pub underlying: String,
    #[serde(default)]
    pub spot: Option<f64>,
    pub strikes: Vec<OptionStrike>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesContract {
    pub symbol: String,
    #[serde(default)]
    pub expiry: Option<String>,
    pub ltp: f64,
    pub net_change: f64,
    pub percentage_change: f64,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

/// Three-way recommendation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Call {
    Buy,
    Sell,
    Hold,
}

impl Call {
    pub fn as_str(&self) -> &'static str {
        match self {
            Call::Buy => "BUY",
            Call::Sell => "SELL",
            Call::Hold => "HOLD",
        }
    }

    /// Lenient parse of upstream labels; `WAIT` is treated as a hold.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BUY" | "STRONG BUY" | "STRONG_BUY" => Some(Call::Buy),
            "SELL" | "STRONG SELL" | "STRONG_SELL" => Some(Call::Sell),
            "HOLD" | "WAIT" | "NEUTRAL" => Some(Call::Hold),
            _ => None,
        }
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of a recommendation widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ltp: Option<f64>,
    #[serde(default)]
    pub nav: Option<f64>,
    #[serde(rename = "recommendation")]
    pub call: Call,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub confidence: Option<u8>,
    #[serde(default, rename = "type")]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub strike: Option<f64>,
}

impl RecommendationItem {
    pub fn new(symbol: impl Into<String>, call: Call) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            ltp: None,
            nav: None,
            call,
            target_price: None,
            confidence: None,
            instrument_type: None,
            expiry: None,
            strike: None,
        }
    }

    /// Price shown on the card: LTP, else NAV, else zero.
    pub fn display_price(&self) -> f64 {
        self.ltp.or(self.nav).unwrap_or(0.0)
    }
}

/// Direction of an index outlook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outlook {
    Bullish,
    Bearish,
}

/// Market-sentiment card for a headline index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOutlook {
    pub symbol: String,
    pub name: String,
    pub prediction: Outlook,
    pub confidence: u8,
    pub target_price: f64,
    pub current_price: f64,
}

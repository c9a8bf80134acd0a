use chrono::{DateTime, Duration, Utc};
use market_core::{
    Candle, CandleInterval, FetchError, FetchResult, FuturesContract, IndexQuote, MarketStatus,
    OptionLeg, OptionStrike, OptionsChain, Quote,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::ProviderConfig;
use crate::http::ProviderHttp;

const EXCHANGE: &str = "NSE";
const EQUITY_SEGMENT: &str = "NSE_EQ";

/// Client for Provider A (Upstox-style `{ data: ... }` envelopes with
/// `last_price` / `net_change` / `percentage_change` field names).
#[derive(Clone)]
pub struct UpstoxClient {
    http: ProviderHttp,
}

impl UpstoxClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self { http: ProviderHttp::new(config) }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderConfig::upstox_from_env())
    }

    async fn get_data<T: serde::de::DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> FetchResult<T> {
        let envelope: DataEnvelope<T> = self.http.get_json(path, query).await?;
        Ok(envelope.data)
    }

    pub async fn get_market_status(&self) -> FetchResult<MarketStatus> {
        let raw: RawMarketStatus = self.get_data(&format!("/market/status/{}", EXCHANGE), &[]).await?;
        let status = raw.market_status.unwrap_or_default();
        Ok(MarketStatus {
            exchange: raw.exchange.unwrap_or_else(|| EXCHANGE.to_string()),
            is_open: status.eq_ignore_ascii_case("open"),
            raw_status: Some(status),
        })
    }

    /// Get a single equity quote
    pub async fn get_quote(&self, symbol: &str) -> FetchResult<Quote> {
        let key = instrument_key(symbol);
        let raw: HashMap<String, RawQuote> = self.get_data(&format!("/market/quote/{}", key), &[]).await?;

        raw.into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key) || k.ends_with(&format!(":{}", symbol)))
            .map(|(_, q)| q.into_quote(symbol))
            .ok_or_else(|| FetchError::MalformedResponse(format!("quote for {} missing from response", symbol)))
    }

    /// Get quotes for several symbols in one request. Missing symbols are skipped.
    pub async fn get_quotes(&self, symbols: &[String]) -> FetchResult<Vec<Quote>> {
        let keys = symbols.iter().map(|s| instrument_key(s)).collect::<Vec<_>>().join(",");
        let mut raw: HashMap<String, RawQuote> =
            self.get_data("/market/quote/multi", &[("symbols", keys)]).await?;

        Ok(symbols
            .iter()
            .filter_map(|s| raw.remove(&instrument_key(s)).map(|q| q.into_quote(s)))
            .collect())
    }

    async fn get_quote_list(&self, path: &str) -> FetchResult<Vec<Quote>> {
        let raw: Vec<RawQuote> = self.get_data(path, &[]).await?;
        Ok(raw.into_iter().filter_map(RawQuote::into_listed_quote).collect())
    }

    pub async fn get_top_gainers(&self) -> FetchResult<Vec<Quote>> {
        self.get_quote_list(&format!("/market/top-gainers/{}", EXCHANGE)).await
    }

    pub async fn get_top_losers(&self) -> FetchResult<Vec<Quote>> {
        self.get_quote_list(&format!("/market/top-losers/{}", EXCHANGE)).await
    }

    pub async fn get_52_week_high(&self) -> FetchResult<Vec<Quote>> {
        self.get_quote_list(&format!("/market/52-week-high/{}", EXCHANGE)).await
    }

    pub async fn get_52_week_low(&self) -> FetchResult<Vec<Quote>> {
        self.get_quote_list(&format!("/market/52-week-low/{}", EXCHANGE)).await
    }

    pub async fn get_highest_traded(&self) -> FetchResult<Vec<Quote>> {
        self.get_quote_list(&format!("/market/highest-traded/{}", EXCHANGE)).await
    }

    pub async fn get_index_composition(&self, index: &str) -> FetchResult<Vec<Quote>> {
        self.get_quote_list(&format!("/market/index/composition/{}", index)).await
    }

    pub async fn get_indices(&self) -> FetchResult<Vec<IndexQuote>> {
        let raw: Vec<RawIndex> = self.get_data(&format!("/market/indices/{}", EXCHANGE), &[]).await?;
        Ok(raw
            .into_iter()
            .filter_map(|r| {
                let name = r.name?;
                let (net_change, percentage_change) =
                    normalize_change(r.last_price, r.net_change, r.percentage_change);
                Some(IndexQuote { name, last_price: r.last_price, net_change, percentage_change })
            })
            .collect())
    }

    /// Get candles for the last 30 days
    pub async fn get_candles(&self, symbol: &str, interval: CandleInterval) -> FetchResult<Vec<Candle>> {
        let to = Utc::now();
        let from = to - Duration::days(30);
        let path = format!(
            "/historical-candle/{}|{}/{}/{}/{}",
            EQUITY_SEGMENT,
            symbol,
            interval.as_path(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let raw: RawCandles = self.get_data(&path, &[]).await?;
        raw.candles.iter().map(|row| parse_candle(row)).collect()
    }

    pub async fn get_options_chain(&self, symbol: &str) -> FetchResult<OptionsChain> {
        let raw: Vec<RawOptionStrike> = self.get_data(&format!("/market/options-chain/{}", symbol), &[]).await?;
        let spot = raw.iter().find_map(|r| r.underlying_spot_price);

        Ok(OptionsChain {
            underlying: symbol.to_string(),
            spot,
            strikes: raw
                .into_iter()
                .map(|r| OptionStrike {
                    strike: r.strike_price,
                    expiry: r.expiry,
                    call: r.call_options.map(RawOptionSide::into_leg),
                    put: r.put_options.map(RawOptionSide::into_leg),
                })
                .collect(),
        })
    }

    pub async fn get_futures(&self, symbol: &str) -> FetchResult<Vec<FuturesContract>> {
        let raw: Vec<RawFuture> = self.get_data(&format!("/market/futures/{}", symbol), &[]).await?;
        Ok(raw
            .into_iter()
            .map(|r| {
                let (net_change, percentage_change) =
                    normalize_change(r.last_price, r.net_change, r.percentage_change);
                FuturesContract {
                    symbol: r.trading_symbol.unwrap_or_else(|| symbol.to_string()),
                    expiry: r.expiry,
                    ltp: r.last_price,
                    net_change,
                    percentage_change,
                    open_interest: r.oi,
                }
            })
            .collect())
    }
}

pub(crate) fn instrument_key(symbol: &str) -> String {
    format!("{}:{}", EQUITY_SEGMENT, symbol.trim().to_uppercase())
}

/// Fill in whichever of absolute / percentage change is missing.
pub(crate) fn normalize_change(last_price: f64, net_change: Option<f64>, pct: Option<f64>) -> (f64, f64) {
    match (net_change, pct) {
        (Some(n), Some(p)) => (n, p),
        (Some(n), None) => {
            let prev = last_price - n;
            let p = if prev.abs() > f64::EPSILON { n / prev * 100.0 } else { 0.0 };
            (n, p)
        }
        (None, Some(p)) => {
            let ratio = 1.0 + p / 100.0;
            let n = if ratio.abs() > f64::EPSILON { last_price - last_price / ratio } else { 0.0 };
            (n, p)
        }
        (None, None) => (0.0, 0.0),
    }
}

fn parse_candle(row: &[serde_json::Value]) -> FetchResult<Candle> {
    let num = |i: usize| -> FetchResult<f64> {
        row.get(i)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| FetchError::MalformedResponse(format!("candle field {} missing or not numeric", i)))
    };
    let timestamp = row
        .first()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| FetchError::MalformedResponse("candle timestamp missing or invalid".to_string()))?;

    Ok(Candle {
        timestamp,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        volume: num(5)?,
        open_interest: row.get(6).and_then(|v| v.as_f64()),
    })
}

// Upstream response types

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RawMarketStatus {
    exchange: Option<String>,
    market_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOhlc {
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(default, alias = "trading_symbol", alias = "tradingsymbol")]
    symbol: Option<String>,
    #[serde(default, alias = "company_name", alias = "instrument_name")]
    name: Option<String>,
    #[serde(alias = "ltp")]
    last_price: f64,
    #[serde(default)]
    net_change: Option<f64>,
    #[serde(default, alias = "percent_change")]
    percentage_change: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    ohlc: Option<RawOhlc>,
    #[serde(default, alias = "52_week_high")]
    week_52_high: Option<f64>,
    #[serde(default, alias = "52_week_low")]
    week_52_low: Option<f64>,
}

impl RawQuote {
    fn into_quote(self, fallback_symbol: &str) -> Quote {
        let (net_change, percentage_change) =
            normalize_change(self.last_price, self.net_change, self.percentage_change);
        let ohlc = self.ohlc.unwrap_or_default();
        Quote {
            symbol: self.symbol.unwrap_or_else(|| fallback_symbol.to_uppercase()),
            name: self.name,
            last_price: self.last_price,
            net_change,
            percentage_change,
            day_high: ohlc.high,
            day_low: ohlc.low,
            week_52_high: self.week_52_high,
            week_52_low: self.week_52_low,
            volume: self.volume,
            fundamentals: Default::default(),
        }
    }

    /// List endpoints must name their rows; unnamed rows are dropped.
    fn into_listed_quote(self) -> Option<Quote> {
        let symbol = self.symbol.clone()?;
        Some(self.into_quote(&symbol))
    }
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(default, alias = "index_name", alias = "symbol")]
    name: Option<String>,
    #[serde(alias = "ltp")]
    last_price: f64,
    #[serde(default)]
    net_change: Option<f64>,
    #[serde(default)]
    percentage_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCandles {
    candles: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawMarketData {
    ltp: f64,
    #[serde(default)]
    net_change: Option<f64>,
    #[serde(default)]
    close_price: Option<f64>,
    #[serde(default)]
    oi: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawOptionSide {
    market_data: RawMarketData,
}

impl RawOptionSide {
    fn into_leg(self) -> OptionLeg {
        let md = self.market_data;
        let net_change = md
            .net_change
            .or_else(|| md.close_price.map(|close| md.ltp - close));
        let (net_change, percentage_change) = normalize_change(md.ltp, net_change, None);
        OptionLeg {
            ltp: md.ltp,
            net_change,
            percentage_change,
            open_interest: md.oi,
            volume: md.volume,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawOptionStrike {
    strike_price: f64,
    #[serde(default)]
    expiry: Option<String>,
    #[serde(default)]
    underlying_spot_price: Option<f64>,
    #[serde(default)]
    call_options: Option<RawOptionSide>,
    #[serde(default)]
    put_options: Option<RawOptionSide>,
}

#[derive(Debug, Deserialize)]
struct RawFuture {
    #[serde(default, alias = "symbol")]
    trading_symbol: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
    #[serde(alias = "ltp")]
    last_price: f64,
    #[serde(default)]
    net_change: Option<f64>,
    #[serde(default)]
    percentage_change: Option<f64>,
    #[serde(default)]
    oi: Option<f64>,
}

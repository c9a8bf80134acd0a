//! Placeholder market data substituted when upstream providers fail.
//!
//! Everything produced here is wrapped as [`market_core::Provenance::Synthetic`]
//! by the adapter. Without jitter the values are fixed baselines, which keeps
//! fallback output reproducible; with jitter prices and changes are perturbed
//! on every call.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use market_core::{
    round2, Candle, CandleInterval, FuturesContract, IndexQuote, MarketStatus, OptionLeg,
    OptionStrike, OptionsChain, Quote,
};
use rand::Rng;

/// (symbol, name, last price, percentage change, volume)
const EQUITIES: &[(&str, &str, f64, f64, f64)] = &[
    ("RELIANCE", "Reliance Industries", 2950.50, 1.20, 2_450_000.0),
    ("TCS", "Tata Consultancy Services", 3542.30, -0.80, 1_890_000.0),
    ("HDFCBANK", "HDFC Bank", 1650.25, 2.60, 3_120_000.0),
    ("INFY", "Infosys", 1456.78, 3.10, 1_670_000.0),
    ("ICICIBANK", "ICICI Bank", 1120.40, -2.40, 2_980_000.0),
    ("SBIN", "State Bank of India", 812.60, 0.50, 4_210_000.0),
    ("ITC", "ITC", 438.15, -0.30, 5_030_000.0),
    ("BHARTIARTL", "Bharti Airtel", 1380.90, 2.20, 1_540_000.0),
    ("LT", "Larsen & Toubro", 3620.00, -1.10, 980_000.0),
    ("KOTAKBANK", "Kotak Mahindra Bank", 1745.35, -2.70, 1_210_000.0),
    ("AXISBANK", "Axis Bank", 1165.80, 1.90, 2_060_000.0),
    ("HINDUNILVR", "Hindustan Unilever", 2410.55, -0.60, 870_000.0),
    ("TATAMOTORS", "Tata Motors", 985.40, 4.30, 6_750_000.0),
    ("MARUTI", "Maruti Suzuki", 12450.00, 0.90, 410_000.0),
    ("SUNPHARMA", "Sun Pharmaceutical", 1540.20, -3.20, 1_330_000.0),
    ("ADANIENT", "Adani Enterprises", 3100.00, 5.10, 2_870_000.0),
    ("WIPRO", "Wipro", 480.35, -1.80, 3_460_000.0),
    ("BAJFINANCE", "Bajaj Finance", 6950.00, 2.90, 760_000.0),
    ("TITAN", "Titan Company", 3380.60, -2.10, 690_000.0),
    ("NTPC", "NTPC", 358.70, 1.40, 7_120_000.0),
];

/// (name, quote symbol, level, percentage change)
const INDICES: &[(&str, &str, f64, f64)] = &[
    ("NIFTY 50", "NIFTY", 25003.05, 0.45),
    ("NIFTY BANK", "BANKNIFTY", 44312.70, -0.35),
    ("SENSEX", "SENSEX", 65953.48, 0.40),
    ("NIFTY IT", "NIFTYIT", 35120.40, 1.10),
    ("NIFTY MIDCAP 100", "MIDCAP", 51230.15, -0.20),
];

/// (symbol, name, price, percentage change)
pub(crate) const INDEX_ETFS: &[(&str, &str, f64, f64)] = &[
    ("NIFTYBEES", "Nippon India ETF Nifty BeES", 265.40, 2.40),
    ("BANKBEES", "Nippon India ETF Bank BeES", 512.30, 0.60),
    ("JUNIORBEES", "Nippon India ETF Junior BeES", 720.15, 2.80),
];

pub(crate) const SECTORAL_ETFS: &[(&str, &str, f64, f64)] = &[
    ("PSUBNKBEES", "PSUBNKBEES ETF", 78.20, 2.10),
    ("ITBEES", "ITBEES ETF", 41.60, -0.40),
    ("PHARMABEES", "PHARMABEES ETF", 19.80, 2.50),
];

pub(crate) const GOLD_ETFS: &[(&str, &str, f64, f64)] = &[
    ("GOLDBEES", "GOLDBEES Gold ETF", 61.20, 2.30),
    ("GOLDSHARE", "GOLDSHARE Gold ETF", 6120.00, 2.20),
];

/// (scheme code, scheme name, NAV, percentage change)
pub(crate) const MUTUAL_FUNDS: &[(&str, &str, f64, f64)] = &[
    ("PPFAS-FLEXI", "Parag Parikh Flexi Cap Fund", 78.45, 2.40),
    ("UTI-NIFTY50", "UTI Nifty 50 Index Fund", 152.30, 0.45),
    ("HDFC-MIDCAP", "HDFC Mid-Cap Opportunities Fund", 168.90, -2.30),
];

pub(crate) const STOCK_DERIVATIVE_UNDERLYINGS: &[&str] = &["RELIANCE", "TCS", "HDFCBANK"];

#[derive(Debug, Clone, Default)]
pub struct SyntheticData {
    jitter: bool,
}

impl SyntheticData {
    pub fn new(jitter: bool) -> Self {
        Self { jitter }
    }

    pub fn deterministic() -> Self {
        Self::new(false)
    }

    fn perturb(&self, price: f64, p_change: f64) -> (f64, f64) {
        if !self.jitter {
            return (price, p_change);
        }
        let mut rng = rand::thread_rng();
        let price = price * (1.0 + rng.gen_range(-0.01..0.01));
        let p_change = p_change + rng.gen_range(-1.5..1.5);
        (round2(price), round2(p_change))
    }

    fn make_quote(&self, symbol: &str, name: Option<&str>, price: f64, p_change: f64, volume: Option<f64>) -> Quote {
        let (price, p_change) = self.perturb(price, p_change);
        let prev = price / (1.0 + p_change / 100.0);
        let mut quote = Quote::new(symbol, price, round2(price - prev), p_change);
        quote.name = name.map(str::to_string);
        quote.day_high = Some(round2(price.max(prev) * 1.005));
        quote.day_low = Some(round2(price.min(prev) * 0.995));
        quote.week_52_high = Some(round2(price * 1.18));
        quote.week_52_low = Some(round2(price * 0.74));
        quote.volume = volume;
        quote
    }

    /// Baseline level for an index or equity symbol.
    pub fn spot(&self, symbol: &str) -> f64 {
        let symbol = symbol.trim().to_uppercase();
        INDICES
            .iter()
            .find(|(_, s, _, _)| *s == symbol)
            .map(|(_, _, level, _)| *level)
            .or_else(|| EQUITIES.iter().find(|(s, ..)| *s == symbol).map(|(_, _, p, _, _)| *p))
            .unwrap_or_else(|| unknown_symbol_price(&symbol))
    }

    fn baseline_change(&self, symbol: &str) -> f64 {
        let symbol = symbol.trim().to_uppercase();
        INDICES
            .iter()
            .find(|(_, s, _, _)| *s == symbol)
            .map(|(_, _, _, p)| *p)
            .or_else(|| EQUITIES.iter().find(|(s, ..)| *s == symbol).map(|(_, _, _, p, _)| *p))
            .unwrap_or(0.0)
    }

    pub fn market_status(&self) -> MarketStatus {
        MarketStatus { exchange: "NSE".to_string(), is_open: false, raw_status: None }
    }

    pub fn quote(&self, symbol: &str) -> Quote {
        let upper = symbol.trim().to_uppercase();
        match EQUITIES.iter().find(|(s, ..)| *s == upper) {
            Some((s, name, price, pct, vol)) => self.make_quote(s, Some(*name), *price, *pct, Some(*vol)),
            None => self.make_quote(&upper, None, self.spot(&upper), self.baseline_change(&upper), None),
        }
    }

    pub fn quotes(&self, symbols: &[String]) -> Vec<Quote> {
        symbols.iter().map(|s| self.quote(s)).collect()
    }

    /// The whole synthetic equity universe.
    pub fn universe(&self) -> Vec<Quote> {
        EQUITIES
            .iter()
            .map(|(s, name, price, pct, vol)| self.make_quote(s, Some(*name), *price, *pct, Some(*vol)))
            .collect()
    }

    pub fn top_gainers(&self) -> Vec<Quote> {
        let mut quotes: Vec<Quote> = self.universe().into_iter().filter(|q| q.percentage_change > 0.0).collect();
        quotes.sort_by(|a, b| b.percentage_change.total_cmp(&a.percentage_change));
        quotes.truncate(10);
        quotes
    }

    pub fn top_losers(&self) -> Vec<Quote> {
        let mut quotes: Vec<Quote> = self.universe().into_iter().filter(|q| q.percentage_change < 0.0).collect();
        quotes.sort_by(|a, b| a.percentage_change.total_cmp(&b.percentage_change));
        quotes.truncate(10);
        quotes
    }

    /// Gainers re-labelled as trading at their 52-week high.
    pub fn week_52_highs(&self) -> Vec<Quote> {
        self.top_gainers()
            .into_iter()
            .map(|mut q| {
                q.week_52_high = Some(q.last_price);
                q
            })
            .collect()
    }

    pub fn week_52_lows(&self) -> Vec<Quote> {
        self.top_losers()
            .into_iter()
            .map(|mut q| {
                q.week_52_low = Some(q.last_price);
                q
            })
            .collect()
    }

    pub fn highest_traded(&self) -> Vec<Quote> {
        let mut quotes = self.universe();
        quotes.sort_by(|a, b| b.volume.unwrap_or(0.0).total_cmp(&a.volume.unwrap_or(0.0)));
        quotes.truncate(10);
        quotes
    }

    pub fn indices(&self) -> Vec<IndexQuote> {
        INDICES
            .iter()
            .map(|(name, _, level, pct)| {
                let (level, pct) = self.perturb(*level, *pct);
                let prev = level / (1.0 + pct / 100.0);
                IndexQuote {
                    name: name.to_string(),
                    last_price: level,
                    net_change: round2(level - prev),
                    percentage_change: pct,
                }
            })
            .collect()
    }

    /// Constituents are the first ten universe names regardless of index.
    pub fn index_composition(&self, _index: &str) -> Vec<Quote> {
        let mut quotes = self.universe();
        quotes.truncate(10);
        quotes
    }

    /// Sixty candles ending now, oscillating around the baseline close.
    pub fn candles(&self, symbol: &str, interval: CandleInterval) -> Vec<Candle> {
        const COUNT: i64 = 60;
        let base = self.spot(symbol);
        let step = Duration::minutes(interval.to_minutes());
        let start = Utc::now() - step * (COUNT as i32);
        let mut rng = self.jitter.then(rand::thread_rng);

        (0..COUNT)
            .map(|i| {
                let wave = (i as f64 / 6.0).sin() * 0.01;
                let noise = rng.as_mut().map(|r| r.gen_range(-0.004..0.004)).unwrap_or(0.0);
                let open = base * (1.0 + wave);
                let close = base * (1.0 + wave + 0.002 + noise);
                Candle {
                    timestamp: start + step * (i as i32),
                    open: round2(open),
                    high: round2(open.max(close) * 1.003),
                    low: round2(open.min(close) * 0.997),
                    close: round2(close),
                    volume: 10_000.0 + (i as f64) * 250.0,
                    open_interest: None,
                }
            })
            .collect()
    }

    /// Eleven strikes centred on the at-the-money strike.
    pub fn options_chain(&self, symbol: &str) -> OptionsChain {
        let upper = symbol.trim().to_uppercase();
        let (spot, _) = self.perturb(self.spot(&upper), 0.0);
        let step = strike_step(&upper, spot);
        let atm = (spot / step).round() * step;
        let expiry = next_weekday(Utc::now().date_naive(), Weekday::Thu).to_string();

        let strikes = (-5..=5)
            .map(|k| {
                let strike = atm + step * k as f64;
                let time_value = spot * 0.004;
                let call_pct = 3.5 - 0.7 * k as f64;
                OptionStrike {
                    strike,
                    expiry: Some(expiry.clone()),
                    call: Some(self.leg((spot - strike).max(0.0) + time_value, call_pct)),
                    put: Some(self.leg((strike - spot).max(0.0) + time_value, -call_pct)),
                }
            })
            .collect();

        OptionsChain { underlying: upper, spot: Some(spot), strikes }
    }

    fn leg(&self, ltp: f64, pct: f64) -> OptionLeg {
        let (ltp, pct) = self.perturb(ltp, pct);
        let prev = ltp / (1.0 + pct / 100.0);
        OptionLeg {
            ltp: round2(ltp),
            net_change: round2(ltp - prev),
            percentage_change: pct,
            open_interest: Some(50_000.0),
            volume: Some(120_000.0),
        }
    }

    /// Near, next and far month contracts.
    pub fn futures(&self, symbol: &str) -> Vec<FuturesContract> {
        let upper = symbol.trim().to_uppercase();
        let today = Utc::now().date_naive();
        let (spot, pct) = self.perturb(self.spot(&upper), self.baseline_change(&upper));

        (0..3)
            .map(|m| {
                let expiry = last_weekday_of_month(add_months(today, m), Weekday::Thu);
                let ltp = round2(spot * (1.0 + 0.003 * (m + 1) as f64));
                let prev = ltp / (1.0 + pct / 100.0);
                FuturesContract {
                    symbol: format!("{}{}FUT", upper, expiry.format("%y%b").to_string().to_uppercase()),
                    expiry: Some(expiry.to_string()),
                    ltp,
                    net_change: round2(ltp - prev),
                    percentage_change: pct,
                    open_interest: Some(1_000_000.0 / (m + 1) as f64),
                }
            })
            .collect()
    }

    /// Quotes for a fixed product table (ETFs, funds).
    pub(crate) fn products(&self, table: &[(&str, &str, f64, f64)]) -> Vec<Quote> {
        table
            .iter()
            .map(|(s, name, price, pct)| self.make_quote(s, Some(*name), *price, *pct, None))
            .collect()
    }
}

fn unknown_symbol_price(symbol: &str) -> f64 {
    let sum: u32 = symbol.bytes().map(u32::from).sum();
    100.0 + f64::from(sum % 4900)
}

fn strike_step(symbol: &str, spot: f64) -> f64 {
    match symbol {
        "NIFTY" => 50.0,
        "BANKNIFTY" | "SENSEX" => 100.0,
        _ => {
            let raw = (spot * 0.02).max(1.0);
            let magnitude = 10f64.powi(raw.log10().floor() as i32);
            (raw / magnitude).round().max(1.0) * magnitude
        }
    }
}

fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() as i64 - from.weekday().num_days_from_monday() as i64) % 7;
    from + Duration::days(ahead)
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

fn last_weekday_of_month(in_month: NaiveDate, weekday: Weekday) -> NaiveDate {
    let first_of_next = add_months(NaiveDate::from_ymd_opt(in_month.year(), in_month.month(), 1).unwrap_or(in_month), 1);
    let last_day = first_of_next - Duration::days(1);
    let back = (7 + last_day.weekday().num_days_from_monday() as i64 - weekday.num_days_from_monday() as i64) % 7;
    last_day - Duration::days(back)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_without_jitter() {
        let synthetic = SyntheticData::deterministic();
        assert_eq!(synthetic.universe(), synthetic.universe());
        assert_eq!(synthetic.quote("RELIANCE").last_price, 2950.50);
    }

    #[test]
    fn test_gainers_and_losers_sorted() {
        let synthetic = SyntheticData::deterministic();
        let gainers = synthetic.top_gainers();
        assert!(gainers.iter().all(|q| q.percentage_change > 0.0));
        assert!(gainers.windows(2).all(|w| w[0].percentage_change >= w[1].percentage_change));
        assert_eq!(gainers[0].symbol, "ADANIENT");

        let losers = synthetic.top_losers();
        assert!(losers.iter().all(|q| q.percentage_change < 0.0));
        assert_eq!(losers[0].symbol, "SUNPHARMA");
    }

    #[test]
    fn test_unknown_symbol_is_stable() {
        let synthetic = SyntheticData::deterministic();
        let a = synthetic.quote("zzz");
        assert_eq!(a.symbol, "ZZZ");
        assert_eq!(a.last_price, synthetic.quote("ZZZ").last_price);
        assert!(a.last_price >= 100.0);
    }

    #[test]
    fn test_options_chain_centred_on_atm() {
        let chain = SyntheticData::deterministic().options_chain("NIFTY");
        assert_eq!(chain.strikes.len(), 11);
        assert_eq!(chain.strikes[5].strike, 25000.0);
        assert!(chain.strikes.iter().all(|s| s.call.is_some() && s.put.is_some()));
    }

    #[test]
    fn test_futures_three_months() {
        let futures = SyntheticData::deterministic().futures("BANKNIFTY");
        assert_eq!(futures.len(), 3);
        assert!(futures.iter().all(|f| f.symbol.starts_with("BANKNIFTY") && f.symbol.ends_with("FUT")));
        assert!(futures[0].ltp < futures[2].ltp);
    }

    #[test]
    fn test_candles_count_and_order() {
        let candles = SyntheticData::deterministic().candles("TCS", CandleInterval::Day);
        assert_eq!(candles.len(), 60);
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(candles.iter().all(|c| c.low <= c.open && c.high >= c.close));
    }

    #[test]
    fn test_calendar_helpers() {
        let wed = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(next_weekday(wed, Weekday::Thu), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(
            last_weekday_of_month(wed, Weekday::Thu),
            NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
        );
        let dec = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(add_months(dec, 1), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_jitter_stays_near_baseline() {
        let synthetic = SyntheticData::new(true);
        for _ in 0..20 {
            let q = synthetic.quote("INFY");
            assert!((q.last_price - 1456.78).abs() < 1456.78 * 0.011);
        }
    }
}

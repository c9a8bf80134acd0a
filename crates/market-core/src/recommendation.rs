//! Threshold rules that turn raw price moves into recommendation calls.
//!
//! Every rule here is a fixed step function on the percentage or absolute
//! change. The thresholds differ per instrument class, so they are carried as
//! configuration values rather than one global rule.

use serde::{Deserialize, Serialize};

use crate::error::UserInputError;
use crate::types::{Call, IndexOutlook, Outlook, Quote, RecommendationItem};

/// Percentage move beyond which a quote is called BUY or SELL.
pub const CALL_THRESHOLD_PCT: f64 = 2.0;

/// Target multiplier for generic equities when upstream gives no target.
pub const EQUITY_TARGET_MULTIPLIER: f64 = 1.15;

/// Classify a percentage change. Exactly ±2 is HOLD.
pub fn derive_call(p_change: f64) -> Call {
    if p_change > CALL_THRESHOLD_PCT {
        Call::Buy
    } else if p_change < -CALL_THRESHOLD_PCT {
        Call::Sell
    } else {
        Call::Hold
    }
}

/// Round to paise.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn target_price(price: f64, multiplier: f64) -> f64 {
    round2(price * multiplier)
}

/// Three-band confidence step function of `|change|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceTiers {
    pub high_above: f64,
    pub medium_above: f64,
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl ConfidenceTiers {
    pub const fn new(high_above: f64, medium_above: f64) -> Self {
        Self { high_above, medium_above, high: 85, medium: 70, low: 60 }
    }

    pub fn confidence(&self, change: f64) -> u8 {
        let magnitude = change.abs();
        if magnitude > self.high_above {
            self.high
        } else if magnitude > self.medium_above {
            self.medium
        } else {
            self.low
        }
    }
}

/// Per-index parameters for the outlook card and index derivatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRule {
    pub symbol: String,
    pub name: String,
    pub tiers: ConfidenceTiers,
    pub up_multiplier: f64,
    pub down_multiplier: f64,
    /// Outlook shown when no live quote for the index is available.
    pub fallback: IndexOutlook,
}

impl IndexRule {
    pub fn nifty() -> Self {
        Self {
            symbol: "NIFTY".to_string(),
            name: "NIFTY 50".to_string(),
            tiers: ConfidenceTiers::new(50.0, 20.0),
            up_multiplier: 1.02,
            down_multiplier: 0.98,
            fallback: IndexOutlook {
                symbol: "NIFTY".to_string(),
                name: "NIFTY 50".to_string(),
                prediction: Outlook::Bullish,
                confidence: 75,
                target_price: 25250.0,
                current_price: 25003.05,
            },
        }
    }

    pub fn bank_nifty() -> Self {
        Self {
            symbol: "BANKNIFTY".to_string(),
            name: "BANK NIFTY".to_string(),
            tiers: ConfidenceTiers::new(100.0, 50.0),
            up_multiplier: 1.015,
            down_multiplier: 0.985,
            fallback: IndexOutlook {
                symbol: "BANKNIFTY".to_string(),
                name: "BANK NIFTY".to_string(),
                prediction: Outlook::Bearish,
                confidence: 68,
                target_price: 43800.0,
                current_price: 44312.70,
            },
        }
    }

    pub fn sensex() -> Self {
        Self {
            symbol: "SENSEX".to_string(),
            name: "SENSEX".to_string(),
            tiers: ConfidenceTiers::new(100.0, 50.0),
            up_multiplier: 1.018,
            down_multiplier: 0.982,
            fallback: IndexOutlook {
                symbol: "SENSEX".to_string(),
                name: "SENSEX".to_string(),
                prediction: Outlook::Bullish,
                confidence: 72,
                target_price: 66500.0,
                current_price: 65953.48,
            },
        }
    }

    pub fn multiplier(&self, change: f64) -> f64 {
        if change >= 0.0 {
            self.up_multiplier
        } else {
            self.down_multiplier
        }
    }

    /// Build the outlook card from a live price and absolute change.
    pub fn outlook(&self, price: f64, change: f64) -> IndexOutlook {
        IndexOutlook {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            prediction: if change >= 0.0 { Outlook::Bullish } else { Outlook::Bearish },
            confidence: self.tiers.confidence(change),
            target_price: target_price(price, self.multiplier(change)),
            current_price: price,
        }
    }

    /// Call for a derivative on this index; the target follows the index multipliers.
    pub fn derivative_item(&self, symbol: impl Into<String>, ltp: f64, change: f64, p_change: f64) -> RecommendationItem {
        let mut item = RecommendationItem::new(symbol, derive_call(p_change));
        item.ltp = Some(ltp);
        item.target_price = Some(target_price(ltp, self.multiplier(change)));
        item.confidence = Some(self.tiers.confidence(change));
        item
    }
}

/// Recommendation widget categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Equity,
    IndexEtfs,
    NiftyFutures,
    #[serde(rename = "banknifty-futures")]
    BankNiftyFutures,
    NiftyOptions,
    #[serde(rename = "banknifty-options")]
    BankNiftyOptions,
    StockFutures,
    StockOptions,
    SectoralEtfs,
    MutualFunds,
    GoldEtf,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Equity,
        Category::IndexEtfs,
        Category::NiftyFutures,
        Category::BankNiftyFutures,
        Category::NiftyOptions,
        Category::BankNiftyOptions,
        Category::StockFutures,
        Category::StockOptions,
        Category::SectoralEtfs,
        Category::MutualFunds,
        Category::GoldEtf,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Equity => "equity",
            Category::IndexEtfs => "index-etfs",
            Category::NiftyFutures => "nifty-futures",
            Category::BankNiftyFutures => "banknifty-futures",
            Category::NiftyOptions => "nifty-options",
            Category::BankNiftyOptions => "banknifty-options",
            Category::StockFutures => "stock-futures",
            Category::StockOptions => "stock-options",
            Category::SectoralEtfs => "sectoral-etfs",
            Category::MutualFunds => "mutual-funds",
            Category::GoldEtf => "gold-etf",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Equity => "Equity Shares",
            Category::IndexEtfs => "Index ETFs",
            Category::NiftyFutures => "Nifty Futures",
            Category::BankNiftyFutures => "Bank Nifty Futures",
            Category::NiftyOptions => "Nifty Options",
            Category::BankNiftyOptions => "Bank Nifty Options",
            Category::StockFutures => "Stock Futures",
            Category::StockOptions => "Stock Options",
            Category::SectoralEtfs => "Sectoral ETFs",
            Category::MutualFunds => "Mutual Funds",
            Category::GoldEtf => "Gold ETF",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = UserInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UserInputError::UnknownCategory(s.to_string()))
    }
}

/// How many BUY items each category contributes to the best-picks list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPicksPlan {
    pub takes: Vec<(Category, usize)>,
}

impl Default for BestPicksPlan {
    fn default() -> Self {
        Self {
            takes: vec![(Category::Equity, 2), (Category::IndexEtfs, 1), (Category::GoldEtf, 1)],
        }
    }
}

impl BestPicksPlan {
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.takes.iter().map(|(c, _)| *c)
    }
}

/// Concatenate the leading BUY items of each category in plan order.
///
/// No re-ranking and no de-duplication: a symbol that is a BUY in two
/// categories appears twice.
pub fn best_picks(plan: &BestPicksPlan, lists: &[(Category, Vec<RecommendationItem>)]) -> Vec<RecommendationItem> {
    let mut picks = Vec::new();
    for (category, take) in &plan.takes {
        let Some((_, items)) = lists.iter().find(|(c, _)| c == category) else {
            continue;
        };
        picks.extend(items.iter().filter(|item| item.call == Call::Buy).take(*take).cloned());
    }
    picks
}

/// Tunable parameters of the deriver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub equity_multiplier: f64,
    pub equity_confidence: u8,
    /// Number of top gainers turned into equity recommendations.
    pub equity_from_gainers: usize,
    pub nifty: IndexRule,
    pub bank_nifty: IndexRule,
    pub sensex: IndexRule,
    pub best_picks: BestPicksPlan,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            equity_multiplier: EQUITY_TARGET_MULTIPLIER,
            equity_confidence: 85,
            equity_from_gainers: 5,
            nifty: IndexRule::nifty(),
            bank_nifty: IndexRule::bank_nifty(),
            sensex: IndexRule::sensex(),
            best_picks: BestPicksPlan::default(),
        }
    }
}

impl RecommendationConfig {
    pub fn index_rules(&self) -> [&IndexRule; 3] {
        [&self.nifty, &self.bank_nifty, &self.sensex]
    }

    pub fn index_rule(&self, symbol: &str) -> Option<&IndexRule> {
        self.index_rules().into_iter().find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Equity recommendation from a quote: derived call, synthesized target.
    pub fn equity_item(&self, quote: &Quote) -> RecommendationItem {
        let mut item = RecommendationItem::new(quote.symbol.clone(), derive_call(quote.percentage_change));
        item.name = quote.name.clone();
        item.ltp = Some(quote.last_price);
        item.target_price = Some(target_price(quote.last_price, self.equity_multiplier));
        item.confidence = Some(self.equity_confidence);
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_call_examples() {
        assert_eq!(derive_call(2.01), Call::Buy);
        assert_eq!(derive_call(-2.01), Call::Sell);
        assert_eq!(derive_call(0.0), Call::Hold);
    }

    #[test]
    fn test_derive_call_boundaries_are_hold() {
        assert_eq!(derive_call(2.0), Call::Hold);
        assert_eq!(derive_call(-2.0), Call::Hold);
        assert_eq!(derive_call(f64::NAN), Call::Hold);
    }

    #[test]
    fn test_derive_call_sweep() {
        for i in -1000..=1000 {
            let p = i as f64 / 100.0;
            let expected = if p > 2.0 {
                Call::Buy
            } else if p < -2.0 {
                Call::Sell
            } else {
                Call::Hold
            };
            assert_eq!(derive_call(p), expected, "p_change {}", p);
        }
    }

    #[test]
    fn test_target_price_example() {
        assert_eq!(target_price(100.0, EQUITY_TARGET_MULTIPLIER), 115.00);
        assert_eq!(format!("{:.2}", target_price(100.0, 1.15)), "115.00");
    }

    #[test]
    fn test_confidence_tiers_per_index() {
        let nifty = IndexRule::nifty();
        assert_eq!(nifty.tiers.confidence(60.0), 85);
        assert_eq!(nifty.tiers.confidence(-30.0), 70);
        assert_eq!(nifty.tiers.confidence(20.0), 60);

        let bank = IndexRule::bank_nifty();
        assert_eq!(bank.tiers.confidence(60.0), 70);
        assert_eq!(bank.tiers.confidence(101.0), 85);
        assert_eq!(bank.tiers.confidence(10.0), 60);
    }

    #[test]
    fn test_index_outlook_direction() {
        let up = IndexRule::nifty().outlook(25000.0, 60.0);
        assert_eq!(up.prediction, Outlook::Bullish);
        assert_eq!(up.target_price, 25500.0);
        assert_eq!(up.confidence, 85);

        let down = IndexRule::bank_nifty().outlook(44000.0, -10.0);
        assert_eq!(down.prediction, Outlook::Bearish);
        assert_eq!(down.target_price, 43340.0);

        let flat = IndexRule::sensex().outlook(66000.0, 0.0);
        assert_eq!(flat.prediction, Outlook::Bullish);
    }

    fn item(symbol: &str, call: Call) -> RecommendationItem {
        RecommendationItem::new(symbol, call)
    }

    #[test]
    fn test_best_picks_order_and_counts() {
        let lists = vec![
            (Category::GoldEtf, vec![item("GOLDBEES", Call::Buy), item("GOLDSHARE", Call::Buy)]),
            (
                Category::Equity,
                vec![item("TCS", Call::Hold), item("INFY", Call::Buy), item("SBIN", Call::Buy), item("ITC", Call::Buy)],
            ),
            (Category::IndexEtfs, vec![item("BANKBEES", Call::Hold), item("NIFTYBEES", Call::Buy)]),
        ];
        let picks = best_picks(&BestPicksPlan::default(), &lists);
        let symbols: Vec<&str> = picks.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["INFY", "SBIN", "NIFTYBEES", "GOLDBEES"]);
    }

    #[test]
    fn test_best_picks_keeps_duplicates() {
        let lists = vec![
            (Category::Equity, vec![item("GOLDBEES", Call::Buy)]),
            (Category::GoldEtf, vec![item("GOLDBEES", Call::Buy)]),
        ];
        let picks = best_picks(&BestPicksPlan::default(), &lists);
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn test_best_picks_missing_category_contributes_nothing() {
        let lists = vec![(Category::Equity, vec![item("INFY", Call::Sell)])];
        assert!(best_picks(&BestPicksPlan::default(), &lists).is_empty());
    }

    #[test]
    fn test_category_slug_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.slug().parse::<Category>().unwrap(), category);
        }
        assert!("crypto".parse::<Category>().is_err());
    }

    #[test]
    fn test_equity_item_from_quote() {
        let config = RecommendationConfig::default();
        let quote = Quote::new("TATAMOTORS", 100.0, 5.0, 5.0);
        let item = config.equity_item(&quote);
        assert_eq!(item.call, Call::Buy);
        assert_eq!(item.target_price, Some(115.0));
        assert_eq!(item.confidence, Some(85));
    }
}

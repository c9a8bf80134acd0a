//! Recommendation categories, best picks and the index outlook card.
//!
//! Every category has its own real attempt chain; all of them share the
//! adapter's fallback policy, with the synthetic lists built by running the
//! same conversions over synthetic market data.

use futures_util::future::join_all;
use market_core::{
    best_picks, derive_call, Call, Category, Envelope, FetchError, FetchResult, FuturesContract,
    IndexOutlook, IndexRule, MarketDataError, MarketResult, OptionLeg, OptionsChain, Quote,
    RecommendationItem,
};

use crate::adapter::{MarketDataService, Query};
use crate::config::FallbackMode;
use crate::synthetic::{
    GOLD_ETFS, INDEX_ETFS, MUTUAL_FUNDS, SECTORAL_ETFS, STOCK_DERIVATIVE_UNDERLYINGS,
};

/// Strikes on each side of spot that become option recommendations.
const OPTION_STRIKES_AROUND_SPOT: usize = 3;

impl MarketDataService {
    pub async fn recommendations(&self, category: Category) -> MarketResult<Envelope<Vec<RecommendationItem>>> {
        self.resolve(Query::Recommendations(category), self.fetch_category(category), || {
            self.synthetic_category(category)
        })
        .await
    }

    /// Every category in display order; one failing category does not affect the rest.
    pub async fn all_recommendations(
        &self,
    ) -> Vec<(Category, MarketResult<Envelope<Vec<RecommendationItem>>>)> {
        let results = join_all(Category::ALL.into_iter().map(|c| self.recommendations(c))).await;
        Category::ALL.into_iter().zip(results).collect()
    }

    /// Leading BUY items of the planned categories.
    ///
    /// All planned categories must resolve live for a live result; if any one
    /// fails the whole list is rebuilt from synthetic categories.
    pub async fn best_picks(&self) -> MarketResult<Envelope<Vec<RecommendationItem>>> {
        let plan = &self.config.recommendations.best_picks;
        let real = async {
            let fetched = join_all(plan.categories().map(|c| async move { (c, self.fetch_category(c).await) })).await;
            let mut lists = Vec::with_capacity(fetched.len());
            for (category, result) in fetched {
                lists.push((category, result?));
            }
            Ok::<_, FetchError>(best_picks(plan, &lists))
        };
        self.resolve(Query::BestPicks, real, || {
            let lists: Vec<_> = plan.categories().map(|c| (c, self.synthetic_category(c))).collect();
            best_picks(plan, &lists)
        })
        .await
    }

    /// Market-sentiment cards for NIFTY, BANKNIFTY and SENSEX.
    ///
    /// Index quotes settle individually: the live result holds a card for each
    /// index whose quote arrived. Only when none arrive do the fixed fallback
    /// cards apply.
    pub async fn index_outlook(&self) -> MarketResult<Envelope<Vec<IndexOutlook>>> {
        let rules = self.config.recommendations.index_rules();
        let (nifty, bank_nifty, sensex) = tokio::join!(
            self.source.quote(&rules[0].symbol),
            self.source.quote(&rules[1].symbol),
            self.source.quote(&rules[2].symbol),
        );

        let mut outlooks = Vec::new();
        let mut last_error = None;
        for (rule, result) in rules.iter().zip([nifty, bank_nifty, sensex]) {
            match result {
                Ok(quote) => outlooks.push(rule.outlook(quote.last_price, quote.net_change)),
                Err(e) => {
                    tracing::debug!("outlook for {} skipped: {}", rule.symbol, e);
                    last_error = Some(e);
                }
            }
        }

        if !outlooks.is_empty() {
            return Ok(Envelope::live(outlooks));
        }
        let error = last_error.unwrap_or_else(|| FetchError::MalformedResponse("no index quotes".to_string()));
        match self.config.fallback {
            FallbackMode::Synthetic => {
                tracing::warn!("{}: no index quote available ({}), serving fallback cards", Query::IndexOutlook, error);
                Ok(Envelope::synthetic(rules.iter().map(|r| r.fallback.clone()).collect()))
            }
            FallbackMode::Strict => Err(MarketDataError::DataUnavailable {
                query: Query::IndexOutlook.to_string(),
                source: error,
            }),
        }
    }

    /// Real attempt chain for one category.
    pub(crate) async fn fetch_category(&self, category: Category) -> FetchResult<Vec<RecommendationItem>> {
        let rules = &self.config.recommendations;
        match category {
            Category::Equity => {
                or_else(category, self.source.recommendations(category), || async move {
                    let gainers = self.source.top_gainers().await?;
                    Ok::<_, FetchError>(
                        gainers.iter().take(rules.equity_from_gainers).map(|q| rules.equity_item(q)).collect(),
                    )
                })
                .await
            }
            Category::IndexEtfs => {
                or_else(category, self.source.recommendations(category), || self.etf_items(INDEX_ETFS)).await
            }
            Category::SectoralEtfs => {
                or_else(category, self.source.recommendations(category), || self.etf_items(SECTORAL_ETFS)).await
            }
            Category::GoldEtf => {
                or_else(category, self.source.recommendations(category), || self.etf_items(GOLD_ETFS)).await
            }
            Category::NiftyFutures | Category::BankNiftyFutures => {
                let rule = index_rule_for(rules, category);
                let contracts = self.source.futures(&rule.symbol).await?;
                Ok(futures_items(&contracts, Some(rule)))
            }
            Category::NiftyOptions | Category::BankNiftyOptions => {
                let rule = index_rule_for(rules, category);
                let chain = self.source.options_chain(&rule.symbol).await?;
                Ok(option_items(&chain, Some(rule)))
            }
            Category::StockFutures => {
                or_else(category, self.source.recommendations(category), || self.stock_futures_items()).await
            }
            Category::StockOptions | Category::MutualFunds => self.source.recommendations(category).await,
        }
    }

    async fn etf_items(&self, table: &[(&str, &str, f64, f64)]) -> FetchResult<Vec<RecommendationItem>> {
        let symbols: Vec<String> = table.iter().map(|(s, ..)| s.to_string()).collect();
        let quotes = self.source.quotes(&symbols).await?;
        // Every listed ETF keeps its row; one missing from the quote response has no ltp.
        Ok(table
            .iter()
            .map(|(symbol, name, _, _)| {
                let mut item = match quotes.iter().find(|q| q.symbol.eq_ignore_ascii_case(symbol)) {
                    Some(quote) => product_item(quote, "ETF"),
                    None => {
                        let mut item = RecommendationItem::new(symbol.to_string(), Call::Hold);
                        item.instrument_type = Some("ETF".to_string());
                        item
                    }
                };
                item.name.get_or_insert_with(|| name.to_string());
                item
            })
            .collect())
    }

    /// Near-month contract of each underlying; underlyings whose request fails are dropped.
    async fn stock_futures_items(&self) -> FetchResult<Vec<RecommendationItem>> {
        let results = join_all(STOCK_DERIVATIVE_UNDERLYINGS.iter().map(|s| self.source.futures(s))).await;
        let mut items = Vec::new();
        let mut last_error = None;
        for (symbol, result) in STOCK_DERIVATIVE_UNDERLYINGS.iter().zip(results) {
            match result {
                Ok(contracts) => items.extend(futures_items(&contracts[..contracts.len().min(1)], None)),
                Err(e) => {
                    tracing::debug!("stock futures for {} dropped: {}", symbol, e);
                    last_error = Some(e);
                }
            }
        }
        match (items.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(items),
        }
    }

    /// Same conversions as the real chains, applied to synthetic data.
    pub(crate) fn synthetic_category(&self, category: Category) -> Vec<RecommendationItem> {
        let rules = &self.config.recommendations;
        let synthetic = &self.synthetic;

        match category {
            Category::Equity => synthetic
                .top_gainers()
                .iter()
                .take(rules.equity_from_gainers)
                .map(|q| rules.equity_item(q))
                .collect(),
            Category::IndexEtfs => self.synthetic_products(INDEX_ETFS, "ETF"),
            Category::SectoralEtfs => self.synthetic_products(SECTORAL_ETFS, "ETF"),
            Category::GoldEtf => self.synthetic_products(GOLD_ETFS, "ETF"),
            Category::NiftyFutures | Category::BankNiftyFutures => {
                let rule = index_rule_for(rules, category);
                futures_items(&synthetic.futures(&rule.symbol), Some(rule))
            }
            Category::NiftyOptions | Category::BankNiftyOptions => {
                let rule = index_rule_for(rules, category);
                option_items(&synthetic.options_chain(&rule.symbol), Some(rule))
            }
            Category::StockFutures => STOCK_DERIVATIVE_UNDERLYINGS
                .iter()
                .flat_map(|s| futures_items(&synthetic.futures(s)[..1], None))
                .collect(),
            Category::StockOptions => STOCK_DERIVATIVE_UNDERLYINGS
                .iter()
                .flat_map(|s| option_items(&synthetic.options_chain(s), None).into_iter().take(2))
                .collect(),
            Category::MutualFunds => self
                .synthetic_products(MUTUAL_FUNDS, "MF")
                .into_iter()
                .map(|mut item| {
                    item.nav = item.ltp.take();
                    item
                })
                .collect(),
        }
    }

    fn synthetic_products(&self, table: &[(&str, &str, f64, f64)], kind: &str) -> Vec<RecommendationItem> {
        self.synthetic.products(table).iter().map(|q| product_item(q, kind)).collect()
    }
}

/// Run `primary`; when it fails log and run `secondary`.
async fn or_else<T, A, B>(category: Category, primary: A, secondary: impl FnOnce() -> B) -> FetchResult<T>
where
    A: std::future::Future<Output = FetchResult<T>>,
    B: std::future::Future<Output = FetchResult<T>>,
{
    match primary.await {
        Ok(v) => Ok(v),
        Err(e) => {
            tracing::debug!("{}: published list unavailable ({}), deriving from quotes", category.slug(), e);
            secondary().await
        }
    }
}

fn index_rule_for(rules: &market_core::RecommendationConfig, category: Category) -> &IndexRule {
    match category {
        Category::BankNiftyFutures | Category::BankNiftyOptions => &rules.bank_nifty,
        _ => &rules.nifty,
    }
}

/// ETF or fund row from a quote; the call is derived from its percentage move.
fn product_item(quote: &Quote, kind: &str) -> RecommendationItem {
    let mut item = RecommendationItem::new(quote.symbol.clone(), derive_call(quote.percentage_change));
    item.name = quote.name.clone();
    item.ltp = Some(quote.last_price);
    item.instrument_type = Some(kind.to_string());
    item
}

fn futures_items(contracts: &[FuturesContract], rule: Option<&IndexRule>) -> Vec<RecommendationItem> {
    contracts
        .iter()
        .map(|c| {
            let mut item = match rule {
                Some(rule) => rule.derivative_item(c.symbol.clone(), c.ltp, c.net_change, c.percentage_change),
                None => {
                    let mut item = RecommendationItem::new(c.symbol.clone(), derive_call(c.percentage_change));
                    item.ltp = Some(c.ltp);
                    item
                }
            };
            item.expiry = c.expiry.clone();
            item.instrument_type = Some("FUT".to_string());
            item
        })
        .collect()
}

/// CE and PE items for the strikes closest to spot.
fn option_items(chain: &OptionsChain, rule: Option<&IndexRule>) -> Vec<RecommendationItem> {
    let mut strikes: Vec<_> = chain.strikes.iter().collect();
    if let Some(spot) = chain.spot {
        strikes.sort_by(|a, b| (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs()));
    }
    strikes.truncate(OPTION_STRIKES_AROUND_SPOT);
    strikes.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    let leg_item = |strike: f64, expiry: &Option<String>, leg: &OptionLeg, side: &str| {
        let symbol = format!("{} {} {}", chain.underlying, strike, side);
        let mut item = match rule {
            Some(rule) => rule.derivative_item(symbol, leg.ltp, leg.net_change, leg.percentage_change),
            None => {
                let mut item = RecommendationItem::new(symbol, derive_call(leg.percentage_change));
                item.ltp = Some(leg.ltp);
                item
            }
        };
        item.strike = Some(strike);
        item.expiry = expiry.clone();
        item.instrument_type = Some(side.to_string());
        item
    };

    strikes
        .into_iter()
        .flat_map(|s| {
            let call = s.call.as_ref().map(|leg| leg_item(s.strike, &s.expiry, leg, "CE"));
            let put = s.put.as_ref().map(|leg| leg_item(s.strike, &s.expiry, leg, "PE"));
            call.into_iter().chain(put)
        })
        .collect()
}

use market_client::MarketClient;
use market_core::{
    paginate, Candle, CandleInterval, Category, Envelope, FetchError, FetchResult, FuturesContract, IndexQuote,
    MarketDataError, MarketDataSource, MarketResult, MarketStatus, OptionsChain, Page,
    PaginationState, Quote, UserInputError,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::{FallbackMode, MarketConfig};
use crate::synthetic::SyntheticData;

/// Identifies an adapter call in logs and in [`MarketDataError::DataUnavailable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MarketStatus,
    Quote(String),
    Quotes(Vec<String>),
    TopGainers,
    TopLosers,
    Week52Highs,
    Week52Lows,
    HighestTraded,
    Indices,
    IndexComposition(String),
    Candles { symbol: String, interval: CandleInterval },
    OptionsChain(String),
    Futures(String),
    AllStocks,
    AllStocksPage { page: usize, limit: usize },
    Recommendations(Category),
    BestPicks,
    IndexOutlook,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::MarketStatus => write!(f, "market status"),
            Query::Quote(symbol) => write!(f, "quote {}", symbol),
            Query::Quotes(symbols) => write!(f, "quotes {}", symbols.join(",")),
            Query::TopGainers => write!(f, "top gainers"),
            Query::TopLosers => write!(f, "top losers"),
            Query::Week52Highs => write!(f, "52-week highs"),
            Query::Week52Lows => write!(f, "52-week lows"),
            Query::HighestTraded => write!(f, "highest traded"),
            Query::Indices => write!(f, "indices"),
            Query::IndexComposition(index) => write!(f, "composition of {}", index),
            Query::Candles { symbol, interval } => write!(f, "{} candles for {}", interval.as_path(), symbol),
            Query::OptionsChain(symbol) => write!(f, "options chain {}", symbol),
            Query::Futures(symbol) => write!(f, "futures {}", symbol),
            Query::AllStocks => write!(f, "all stocks"),
            Query::AllStocksPage { page, limit } => write!(f, "all stocks page {} (limit {})", page, limit),
            Query::Recommendations(category) => write!(f, "{} recommendations", category.slug()),
            Query::BestPicks => write!(f, "best picks"),
            Query::IndexOutlook => write!(f, "index outlook"),
        }
    }
}

/// Single entry point for every dashboard read.
///
/// Each operation makes its real attempt against the injected
/// [`MarketDataSource`] and, when that fails, either substitutes
/// [`SyntheticData`] or reports the failure, depending on
/// [`FallbackMode`]. Cloning is cheap; the source is shared.
#[derive(Clone)]
pub struct MarketDataService {
    pub(crate) source: Arc<dyn MarketDataSource>,
    pub(crate) synthetic: SyntheticData,
    pub(crate) config: MarketConfig,
}

impl MarketDataService {
    pub fn new(source: Arc<dyn MarketDataSource>, config: MarketConfig) -> Self {
        let synthetic = SyntheticData::new(config.synthetic_jitter);
        Self { source, synthetic, config }
    }

    /// Build both HTTP providers from the configuration.
    pub fn from_config(config: MarketConfig) -> Self {
        let client = MarketClient::new(config.upstox.clone(), config.indian_api.clone());
        Self::new(Arc::new(client), config)
    }

    pub fn from_env() -> Self {
        Self::from_config(MarketConfig::from_env())
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn synthetic(&self) -> &SyntheticData {
        &self.synthetic
    }

    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }

    /// Await the real attempt; on failure fall back or fail per [`FallbackMode`].
    pub(crate) async fn resolve<T, F>(&self, query: Query, real: F, fallback: impl FnOnce() -> T) -> MarketResult<Envelope<T>>
    where
        F: Future<Output = FetchResult<T>>,
    {
        match real.await {
            Ok(data) => {
                tracing::debug!("{}: live data from {}", query, self.source.source_name());
                Ok(Envelope::live(data))
            }
            Err(e) => match self.config.fallback {
                FallbackMode::Synthetic => {
                    tracing::warn!("{}: upstream failed ({}), serving synthetic data", query, e);
                    Ok(Envelope::synthetic(fallback()))
                }
                FallbackMode::Strict => {
                    tracing::warn!("{}: upstream failed ({})", query, e);
                    Err(MarketDataError::DataUnavailable { query: query.to_string(), source: e })
                }
            },
        }
    }

    pub async fn market_status(&self) -> MarketResult<Envelope<MarketStatus>> {
        self.resolve(Query::MarketStatus, self.source.market_status(), || self.synthetic.market_status())
            .await
    }

    pub async fn quote(&self, symbol: &str) -> MarketResult<Envelope<Quote>> {
        let symbol = normalize_symbol(symbol)?;
        self.resolve(Query::Quote(symbol.clone()), self.source.quote(&symbol), || self.synthetic.quote(&symbol))
            .await
    }

    /// Quotes for several symbols in one upstream request. Blank entries are ignored.
    pub async fn quotes(&self, symbols: &[String]) -> MarketResult<Envelope<Vec<Quote>>> {
        let symbols: Vec<String> = symbols.iter().filter_map(|s| normalize_symbol(s).ok()).collect();
        if symbols.is_empty() {
            return Err(UserInputError::EmptySymbol.into());
        }
        self.resolve(Query::Quotes(symbols.clone()), self.source.quotes(&symbols), || {
            self.synthetic.quotes(&symbols)
        })
        .await
    }

    pub async fn top_gainers(&self) -> MarketResult<Envelope<Vec<Quote>>> {
        self.resolve(Query::TopGainers, self.source.top_gainers(), || self.synthetic.top_gainers())
            .await
    }

    pub async fn top_losers(&self) -> MarketResult<Envelope<Vec<Quote>>> {
        self.resolve(Query::TopLosers, self.source.top_losers(), || self.synthetic.top_losers())
            .await
    }

    pub async fn week_52_highs(&self) -> MarketResult<Envelope<Vec<Quote>>> {
        self.resolve(Query::Week52Highs, self.source.week_52_highs(), || self.synthetic.week_52_highs())
            .await
    }

    pub async fn week_52_lows(&self) -> MarketResult<Envelope<Vec<Quote>>> {
        self.resolve(Query::Week52Lows, self.source.week_52_lows(), || self.synthetic.week_52_lows())
            .await
    }

    pub async fn highest_traded(&self) -> MarketResult<Envelope<Vec<Quote>>> {
        self.resolve(Query::HighestTraded, self.source.highest_traded(), || self.synthetic.highest_traded())
            .await
    }

    pub async fn indices(&self) -> MarketResult<Envelope<Vec<IndexQuote>>> {
        self.resolve(Query::Indices, self.source.indices(), || self.synthetic.indices())
            .await
    }

    pub async fn index_composition(&self, index: &str) -> MarketResult<Envelope<Vec<Quote>>> {
        let index = normalize_symbol(index)?;
        self.resolve(
            Query::IndexComposition(index.clone()),
            self.source.index_composition(&index),
            || self.synthetic.index_composition(&index),
        )
        .await
    }

    pub async fn candles(&self, symbol: &str, interval: CandleInterval) -> MarketResult<Envelope<Vec<Candle>>> {
        let symbol = normalize_symbol(symbol)?;
        self.resolve(
            Query::Candles { symbol: symbol.clone(), interval },
            self.source.candles(&symbol, interval),
            || self.synthetic.candles(&symbol, interval),
        )
        .await
    }

    pub async fn options_chain(&self, symbol: &str) -> MarketResult<Envelope<OptionsChain>> {
        let symbol = normalize_symbol(symbol)?;
        self.resolve(Query::OptionsChain(symbol.clone()), self.source.options_chain(&symbol), || {
            self.synthetic.options_chain(&symbol)
        })
        .await
    }

    pub async fn futures(&self, symbol: &str) -> MarketResult<Envelope<Vec<FuturesContract>>> {
        let symbol = normalize_symbol(symbol)?;
        self.resolve(Query::Futures(symbol.clone()), self.source.futures(&symbol), || {
            self.synthetic.futures(&symbol)
        })
        .await
    }

    pub async fn all_stocks(&self) -> MarketResult<Envelope<Vec<Quote>>> {
        self.resolve(Query::AllStocks, self.source.all_stocks(), || self.synthetic.universe())
            .await
    }

    /// One page of the stock list.
    ///
    /// Provider-side paging is tried first, then the full list is fetched and
    /// paged locally. Arguments are validated before any request is made.
    pub async fn all_stocks_page(&self, page: usize, limit: usize) -> MarketResult<Envelope<Page<Quote>>> {
        // Validates page and limit; the empty result itself is discarded.
        paginate::<Quote>(&[], page, limit)?;

        let real = async {
            match self.source.all_stocks_page(page, limit).await {
                Ok(page) => Ok(page),
                Err(e) => {
                    tracing::debug!("provider paging failed ({}), paging the full list locally", e);
                    let all = self.source.all_stocks().await?;
                    Ok::<_, FetchError>(local_page(&all, page, limit))
                }
            }
        };
        self.resolve(Query::AllStocksPage { page, limit }, real, || {
            local_page(&self.synthetic.universe(), page, limit)
        })
        .await
    }
}

fn normalize_symbol(symbol: &str) -> Result<String, UserInputError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(UserInputError::EmptySymbol);
    }
    Ok(symbol.to_uppercase())
}

/// Page already-validated arguments.
fn local_page(list: &[Quote], page: usize, limit: usize) -> Page<Quote> {
    paginate(list, page, limit).unwrap_or_else(|_| Page {
        data: Vec::new(),
        pagination: PaginationState {
            current_page: page,
            total_pages: 0,
            total_count: list.len(),
            has_next: false,
            has_prev: page > 1,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_labels() {
        assert_eq!(Query::Quote("TCS".into()).to_string(), "quote TCS");
        assert_eq!(
            Query::Candles { symbol: "INFY".into(), interval: CandleInterval::Day }.to_string(),
            "day candles for INFY"
        );
        assert_eq!(Query::Recommendations(Category::GoldEtf).to_string(), "gold-etf recommendations");
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" reliance ").unwrap(), "RELIANCE");
        assert_eq!(normalize_symbol("  "), Err(UserInputError::EmptySymbol));
    }
}

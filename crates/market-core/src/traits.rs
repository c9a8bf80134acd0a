use async_trait::async_trait;

use crate::{
    Candle, CandleInterval, Category, FetchResult, FuturesContract, IndexQuote, MarketStatus,
    OptionsChain, Page, Quote, RecommendationItem,
};

/// Real (non-fallback) access to upstream market data.
///
/// Every method is one real attempt, possibly chained across providers, and
/// reports failure as a [`crate::FetchError`]. Substituting placeholder data is
/// the caller's job.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn market_status(&self) -> FetchResult<MarketStatus>;

    async fn quote(&self, symbol: &str) -> FetchResult<Quote>;

    async fn quotes(&self, symbols: &[String]) -> FetchResult<Vec<Quote>>;

    async fn top_gainers(&self) -> FetchResult<Vec<Quote>>;

    async fn top_losers(&self) -> FetchResult<Vec<Quote>>;

    async fn week_52_highs(&self) -> FetchResult<Vec<Quote>>;

    async fn week_52_lows(&self) -> FetchResult<Vec<Quote>>;

    async fn highest_traded(&self) -> FetchResult<Vec<Quote>>;

    async fn indices(&self) -> FetchResult<Vec<IndexQuote>>;

    async fn index_composition(&self, index: &str) -> FetchResult<Vec<Quote>>;

    async fn candles(&self, symbol: &str, interval: CandleInterval) -> FetchResult<Vec<Candle>>;

    async fn options_chain(&self, symbol: &str) -> FetchResult<OptionsChain>;

    async fn futures(&self, symbol: &str) -> FetchResult<Vec<FuturesContract>>;

    async fn all_stocks(&self) -> FetchResult<Vec<Quote>>;

    /// Upstream-paginated stock list; `Err` when the provider cannot page.
    async fn all_stocks_page(&self, page: usize, limit: usize) -> FetchResult<Page<Quote>>;

    /// Published recommendation list for a category, where a provider has one.
    async fn recommendations(&self, category: Category) -> FetchResult<Vec<RecommendationItem>>;

    fn source_name(&self) -> &'static str;
}

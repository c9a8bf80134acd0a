#![allow(dead_code)]

use async_trait::async_trait;
use market_client::{AuthScheme, ProviderConfig};
use market_core::{
    Candle, CandleInterval, Category, FetchError, FetchResult, FuturesContract, IndexQuote,
    MarketDataSource, MarketStatus, OptionsChain, Page, Quote, RecommendationItem,
};
use market_service::{MarketConfig, MarketDataService};
use std::sync::Arc;

/// Source whose every call fails with the given error.
pub struct FailingSource(pub FetchError);

impl FailingSource {
    pub fn down() -> Self {
        Self(FetchError::UpstreamStatus { code: 503, body: "maintenance".to_string() })
    }
}

#[async_trait]
impl MarketDataSource for FailingSource {
    async fn market_status(&self) -> FetchResult<MarketStatus> {
        Err(self.0.clone())
    }
    async fn quote(&self, _symbol: &str) -> FetchResult<Quote> {
        Err(self.0.clone())
    }
    async fn quotes(&self, _symbols: &[String]) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn top_gainers(&self) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn top_losers(&self) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn week_52_highs(&self) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn week_52_lows(&self) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn highest_traded(&self) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn indices(&self) -> FetchResult<Vec<IndexQuote>> {
        Err(self.0.clone())
    }
    async fn index_composition(&self, _index: &str) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn candles(&self, _symbol: &str, _interval: CandleInterval) -> FetchResult<Vec<Candle>> {
        Err(self.0.clone())
    }
    async fn options_chain(&self, _symbol: &str) -> FetchResult<OptionsChain> {
        Err(self.0.clone())
    }
    async fn futures(&self, _symbol: &str) -> FetchResult<Vec<FuturesContract>> {
        Err(self.0.clone())
    }
    async fn all_stocks(&self) -> FetchResult<Vec<Quote>> {
        Err(self.0.clone())
    }
    async fn all_stocks_page(&self, _page: usize, _limit: usize) -> FetchResult<Page<Quote>> {
        Err(self.0.clone())
    }
    async fn recommendations(&self, _category: Category) -> FetchResult<Vec<RecommendationItem>> {
        Err(self.0.clone())
    }
    fn source_name(&self) -> &'static str {
        "failing"
    }
}

pub fn test_config(upstox: &str, indian_api: &str) -> MarketConfig {
    MarketConfig::new(
        ProviderConfig::new("upstox", upstox, AuthScheme::None),
        ProviderConfig::new("indian_api", indian_api, AuthScheme::None),
    )
}

pub fn failing_service() -> MarketDataService {
    MarketDataService::new(Arc::new(FailingSource::down()), test_config("http://127.0.0.1:1", "http://127.0.0.1:1"))
}

pub fn strict_failing_service() -> MarketDataService {
    MarketDataService::new(
        Arc::new(FailingSource::down()),
        test_config("http://127.0.0.1:1", "http://127.0.0.1:1").strict(),
    )
}

pub mod config;
mod http;
pub mod indian_api;
pub mod upstox;

pub use config::{AuthScheme, ProviderConfig};
pub use indian_api::IndianApiClient;
pub use upstox::UpstoxClient;

use async_trait::async_trait;
use market_core::{
    Candle, CandleInterval, Category, FetchResult, FuturesContract, IndexQuote, MarketDataSource,
    MarketStatus, OptionsChain, Page, Quote, RecommendationItem,
};
use std::future::Future;

/// Both providers behind one [`MarketDataSource`].
///
/// Lists that both providers publish are tried on Provider B first and on
/// Provider A second; both are live sources.
#[derive(Clone)]
pub struct MarketClient {
    pub upstox: UpstoxClient,
    pub indian_api: IndianApiClient,
}

impl MarketClient {
    pub fn new(upstox: ProviderConfig, indian_api: ProviderConfig) -> Self {
        Self {
            upstox: UpstoxClient::new(upstox),
            indian_api: IndianApiClient::new(indian_api),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderConfig::upstox_from_env(), ProviderConfig::indian_api_from_env())
    }
}

/// Run `primary`; on failure log it and run `secondary`.
async fn chain<T, A, B>(what: &str, primary: A, secondary: impl FnOnce() -> B) -> FetchResult<T>
where
    A: Future<Output = FetchResult<T>>,
    B: Future<Output = FetchResult<T>>,
{
    match primary.await {
        Ok(v) => Ok(v),
        Err(e) => {
            tracing::debug!("{}: primary provider failed ({}), trying secondary", what, e);
            secondary().await
        }
    }
}

#[async_trait]
impl MarketDataSource for MarketClient {
    async fn market_status(&self) -> FetchResult<MarketStatus> {
        self.upstox.get_market_status().await
    }

    async fn quote(&self, symbol: &str) -> FetchResult<Quote> {
        self.upstox.get_quote(symbol).await
    }

    async fn quotes(&self, symbols: &[String]) -> FetchResult<Vec<Quote>> {
        self.upstox.get_quotes(symbols).await
    }

    async fn top_gainers(&self) -> FetchResult<Vec<Quote>> {
        chain("top gainers", self.indian_api.get_top_gainers(), || self.upstox.get_top_gainers()).await
    }

    async fn top_losers(&self) -> FetchResult<Vec<Quote>> {
        chain("top losers", self.indian_api.get_top_losers(), || self.upstox.get_top_losers()).await
    }

    async fn week_52_highs(&self) -> FetchResult<Vec<Quote>> {
        chain("52-week highs", self.indian_api.get_52_week_high(), || self.upstox.get_52_week_high()).await
    }

    async fn week_52_lows(&self) -> FetchResult<Vec<Quote>> {
        chain("52-week lows", self.indian_api.get_52_week_low(), || self.upstox.get_52_week_low()).await
    }

    async fn highest_traded(&self) -> FetchResult<Vec<Quote>> {
        self.upstox.get_highest_traded().await
    }

    async fn indices(&self) -> FetchResult<Vec<IndexQuote>> {
        self.upstox.get_indices().await
    }

    async fn index_composition(&self, index: &str) -> FetchResult<Vec<Quote>> {
        self.upstox.get_index_composition(index).await
    }

    async fn candles(&self, symbol: &str, interval: CandleInterval) -> FetchResult<Vec<Candle>> {
        self.upstox.get_candles(symbol, interval).await
    }

    async fn options_chain(&self, symbol: &str) -> FetchResult<OptionsChain> {
        self.upstox.get_options_chain(symbol).await
    }

    async fn futures(&self, symbol: &str) -> FetchResult<Vec<FuturesContract>> {
        self.upstox.get_futures(symbol).await
    }

    /// Falls back to the index list re-shaped as stocks when Provider B is down.
    async fn all_stocks(&self) -> FetchResult<Vec<Quote>> {
        chain("all stocks", self.indian_api.get_all_stocks(), || async move {
            let indices = self.upstox.get_indices().await?;
            Ok::<_, market_core::FetchError>(indices
                .into_iter()
                .map(|i| {
                    let mut quote = Quote::new(i.name.clone(), i.last_price, i.net_change, i.percentage_change);
                    quote.name = Some(i.name);
                    quote
                })
                .collect())
        })
        .await
    }

    async fn all_stocks_page(&self, page: usize, limit: usize) -> FetchResult<Page<Quote>> {
        self.indian_api.get_all_stocks_page(page, limit).await
    }

    async fn recommendations(&self, category: Category) -> FetchResult<Vec<RecommendationItem>> {
        self.indian_api.get_recommendations(category).await
    }

    fn source_name(&self) -> &'static str {
        "upstox+indian_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_gainers_fall_through_to_upstox() {
        let indian = MockServer::start().await;
        let upstox = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stocks/top-gainers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&indian)
            .await;
        Mock::given(method("GET"))
            .and(path("/market/top-gainers/NSE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "symbol": "ADANIENT", "last_price": 3100.0, "percentage_change": 6.2 }]
            })))
            .mount(&upstox)
            .await;

        let client = MarketClient::new(
            ProviderConfig::new("upstox", upstox.uri(), AuthScheme::None),
            ProviderConfig::new("indian_api", indian.uri(), AuthScheme::None),
        );
        let gainers = client.top_gainers().await.unwrap();
        assert_eq!(gainers.len(), 1);
        assert_eq!(gainers[0].symbol, "ADANIENT");
        assert_eq!(gainers[0].percentage_change, 6.2);
    }

    #[tokio::test]
    async fn test_all_stocks_uses_indices_when_provider_b_down() {
        let indian = MockServer::start().await;
        let upstox = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market/indices/NSE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "name": "NIFTY 50", "last_price": 25003.05, "net_change": 120.0 }]
            })))
            .mount(&upstox)
            .await;

        let client = MarketClient::new(
            ProviderConfig::new("upstox", upstox.uri(), AuthScheme::None),
            ProviderConfig::new("indian_api", indian.uri(), AuthScheme::None),
        );
        let stocks = client.all_stocks().await.unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0].symbol, "NIFTY 50");
    }
}

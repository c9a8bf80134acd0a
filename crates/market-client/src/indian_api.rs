use market_core::{
    derive_call, Call, Category, FetchError, FetchResult, Fundamentals, Page, PaginationState,
    Quote, RecommendationItem,
};
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::http::ProviderHttp;
use crate::upstox::normalize_change;

/// Client for Provider B (IndianAPI-style `{ data: [...] }` bodies using
/// `price` / `ltp` / `change` / `pChange`).
#[derive(Clone)]
pub struct IndianApiClient {
    http: ProviderHttp,
}

impl IndianApiClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self { http: ProviderHttp::new(config) }
    }

    pub fn from_env() -> Self {
        Self::new(ProviderConfig::indian_api_from_env())
    }

    async fn get_stock_list(&self, path: &str, query: &[(&str, String)]) -> FetchResult<Vec<Quote>> {
        let raw: StockList = self.http.get_json(path, query).await?;
        Ok(raw.data.into_iter().filter_map(RawStock::into_quote).collect())
    }

    pub async fn get_top_gainers(&self) -> FetchResult<Vec<Quote>> {
        self.get_stock_list("/stocks/top-gainers", &[]).await
    }

    pub async fn get_top_losers(&self) -> FetchResult<Vec<Quote>> {
        self.get_stock_list("/stocks/top-losers", &[]).await
    }

    pub async fn get_52_week_high(&self) -> FetchResult<Vec<Quote>> {
        self.get_stock_list("/stocks/52-week-high", &[]).await
    }

    pub async fn get_52_week_low(&self) -> FetchResult<Vec<Quote>> {
        self.get_stock_list("/stocks/52-week-low", &[]).await
    }

    pub async fn get_all_stocks(&self) -> FetchResult<Vec<Quote>> {
        self.get_stock_list("/stocks/all", &[]).await
    }

    /// Provider-side pagination. A body without pagination metadata is
    /// malformed, so callers can page the full list themselves.
    pub async fn get_all_stocks_page(&self, page: usize, limit: usize) -> FetchResult<Page<Quote>> {
        let raw: PagedStockList = self
            .http
            .get_json("/stocks/all", &[("page", page.to_string()), ("limit", limit.to_string())])
            .await?;
        let quotes: Vec<Quote> = raw.data.into_iter().filter_map(RawStock::into_quote).collect();

        let pagination = raw
            .pagination
            .ok_or_else(|| FetchError::MalformedResponse("/stocks/all page without pagination".to_string()))?;
        Ok(Page { data: quotes, pagination })
    }

    /// Published list for a category; `None` when this provider has no endpoint for it.
    pub fn recommendation_path(category: Category) -> Option<&'static str> {
        match category {
            Category::Equity => Some("/recommendations/equity"),
            Category::IndexEtfs => Some("/recommendations/index-etfs"),
            Category::StockFutures => Some("/recommendations/stock-futures"),
            Category::StockOptions => Some("/recommendations/stock-options"),
            Category::SectoralEtfs => Some("/recommendations/sectoral-etfs"),
            Category::MutualFunds => Some("/recommendations/mutual-funds"),
            Category::GoldEtf => Some("/recommendations/gold-etf"),
            Category::NiftyFutures
            | Category::BankNiftyFutures
            | Category::NiftyOptions
            | Category::BankNiftyOptions => None,
        }
    }

    pub async fn get_recommendations(&self, category: Category) -> FetchResult<Vec<RecommendationItem>> {
        let path = Self::recommendation_path(category).ok_or_else(|| {
            FetchError::UpstreamStatus {
                code: 404,
                body: format!("{} has no {} endpoint", self.http.name(), category.slug()),
            }
        })?;
        let raw: RecommendationList = self.http.get_json(path, &[]).await?;
        Ok(raw.data.into_iter().filter_map(RawRecommendation::into_item).collect())
    }
}

#[derive(Debug, Deserialize)]
struct StockList {
    data: Vec<RawStock>,
}

#[derive(Debug, Deserialize)]
struct PagedStockList {
    data: Vec<RawStock>,
    #[serde(default)]
    pagination: Option<PaginationState>,
}

#[derive(Debug, Deserialize)]
struct RawStock {
    #[serde(default, alias = "ticker_id", alias = "ticker")]
    symbol: Option<String>,
    #[serde(default, alias = "company_name", alias = "company")]
    name: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    ltp: Option<f64>,
    #[serde(default, alias = "net_change")]
    change: Option<f64>,
    #[serde(default, rename = "pChange", alias = "percent_change", alias = "percentage_change")]
    p_change: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default, alias = "52_week_high")]
    year_high: Option<f64>,
    #[serde(default, alias = "52_week_low")]
    year_low: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    pe: Option<f64>,
    #[serde(default)]
    roe: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    debt_to_equity: Option<f64>,
    #[serde(default)]
    dividend_yield: Option<f64>,
}

impl RawStock {
    /// Rows without a symbol or any price are dropped.
    fn into_quote(self) -> Option<Quote> {
        let symbol = self.symbol?;
        let last_price = self.price.or(self.ltp)?;
        let (net_change, percentage_change) = normalize_change(last_price, self.change, self.p_change);
        Some(Quote {
            symbol,
            name: self.name,
            last_price,
            net_change,
            percentage_change,
            day_high: self.high,
            day_low: self.low,
            week_52_high: self.year_high,
            week_52_low: self.year_low,
            volume: self.volume,
            fundamentals: Fundamentals {
                pe: self.pe,
                roe: self.roe,
                market_cap: self.market_cap,
                debt_to_equity: self.debt_to_equity,
                dividend_yield: self.dividend_yield,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecommendationList {
    data: Vec<RawRecommendation>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "price")]
    ltp: Option<f64>,
    #[serde(default)]
    nav: Option<f64>,
    #[serde(default, alias = "call")]
    recommendation: Option<String>,
    #[serde(default, rename = "pChange", alias = "percent_change")]
    p_change: Option<f64>,
    #[serde(default)]
    target_price: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, rename = "type")]
    instrument_type: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
    #[serde(default)]
    strike: Option<f64>,
}

impl RawRecommendation {
    /// Upstream label wins; otherwise the call is derived from `pChange`.
    fn into_item(self) -> Option<RecommendationItem> {
        let symbol = self.symbol.or_else(|| self.name.clone())?;
        let call = self
            .recommendation
            .as_deref()
            .and_then(Call::parse)
            .or_else(|| self.p_change.map(derive_call))
            .unwrap_or(Call::Hold);

        Some(RecommendationItem {
            symbol,
            name: self.name,
            ltp: self.ltp,
            nav: self.nav,
            call,
            target_price: self.target_price,
            confidence: self.confidence.map(|c| c.clamp(0.0, 100.0).round() as u8),
            instrument_type: self.instrument_type,
            expiry: self.expiry,
            strike: self.strike,
        })
    }
}

mod common;

use common::test_config;
use market_core::{Call, Category, Outlook, Provenance};
use market_service::MarketDataService;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Upstreams {
    upstox: MockServer,
    indian_api: MockServer,
}

impl Upstreams {
    async fn start() -> Self {
        Self { upstox: MockServer::start().await, indian_api: MockServer::start().await }
    }

    fn service(&self) -> MarketDataService {
        MarketDataService::from_config(test_config(&self.upstox.uri(), &self.indian_api.uri()))
    }

    fn strict_service(&self) -> MarketDataService {
        MarketDataService::from_config(test_config(&self.upstox.uri(), &self.indian_api.uri()).strict())
    }
}

async fn respond(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_live_gainers_from_provider_b() {
    let up = Upstreams::start().await;
    respond(
        &up.indian_api,
        "/stocks/top-gainers",
        json!({ "data": [{ "symbol": "TATAMOTORS", "price": 985.4, "pChange": 4.3 }] }),
    )
    .await;

    let gainers = up.service().top_gainers().await.unwrap();
    assert_eq!(gainers.source, Provenance::Live);
    assert_eq!(gainers.data[0].symbol, "TATAMOTORS");
}

#[tokio::test]
async fn test_both_providers_down_serves_synthetic() {
    let up = Upstreams::start().await;
    let gainers = up.service().top_gainers().await.unwrap();
    assert_eq!(gainers.source, Provenance::Synthetic);
    assert!(up.strict_service().top_gainers().await.is_err());
}

#[tokio::test]
async fn test_index_outlook_settles_individually() {
    let up = Upstreams::start().await;
    respond(
        &up.upstox,
        "/market/quote/NSE_EQ:NIFTY",
        json!({ "data": { "NSE_EQ:NIFTY": { "last_price": 25000.0, "net_change": -30.0 } } }),
    )
    .await;

    let outlook = up.service().index_outlook().await.unwrap();
    assert_eq!(outlook.source, Provenance::Live);
    assert_eq!(outlook.data.len(), 1);
    let nifty = &outlook.data[0];
    assert_eq!(nifty.prediction, Outlook::Bearish);
    assert_eq!(nifty.confidence, 70);
    assert_eq!(nifty.target_price, 24500.0);
}

#[tokio::test]
async fn test_equity_recommendations_derived_from_gainers() {
    let up = Upstreams::start().await;
    respond(
        &up.indian_api,
        "/stocks/top-gainers",
        json!({ "data": [
            { "symbol": "ADANIENT", "price": 100.0, "pChange": 5.1 },
            { "symbol": "SBIN", "price": 812.6, "pChange": 1.5 }
        ] }),
    )
    .await;

    let equity = up.service().recommendations(Category::Equity).await.unwrap();
    assert_eq!(equity.source, Provenance::Live);
    assert_eq!(equity.data[0].call, Call::Buy);
    assert_eq!(equity.data[0].target_price, Some(115.0));
    assert_eq!(equity.data[0].confidence, Some(85));
    assert_eq!(equity.data[1].call, Call::Hold);
}

#[tokio::test]
async fn test_live_best_picks_take_buys_in_plan_order() {
    let up = Upstreams::start().await;
    respond(
        &up.indian_api,
        "/recommendations/equity",
        json!({ "data": [
            { "symbol": "TCS", "recommendation": "HOLD" },
            { "symbol": "INFY", "recommendation": "BUY" },
            { "symbol": "HDFCBANK", "recommendation": "BUY" },
            { "symbol": "ITC", "recommendation": "BUY" }
        ] }),
    )
    .await;
    respond(
        &up.indian_api,
        "/recommendations/index-etfs",
        json!({ "data": [
            { "symbol": "BANKBEES", "recommendation": "SELL" },
            { "symbol": "NIFTYBEES", "recommendation": "BUY" }
        ] }),
    )
    .await;
    respond(
        &up.indian_api,
        "/recommendations/gold-etf",
        json!({ "data": [{ "symbol": "GOLDBEES", "nav": 61.2, "recommendation": "BUY" }] }),
    )
    .await;

    let picks = up.service().best_picks().await.unwrap();
    assert_eq!(picks.source, Provenance::Live);
    let symbols: Vec<&str> = picks.data.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["INFY", "HDFCBANK", "NIFTYBEES", "GOLDBEES"]);
}

#[tokio::test]
async fn test_best_picks_fall_back_when_one_category_fails() {
    let up = Upstreams::start().await;
    respond(
        &up.indian_api,
        "/recommendations/equity",
        json!({ "data": [{ "symbol": "INFY", "recommendation": "BUY" }] }),
    )
    .await;
    respond(
        &up.indian_api,
        "/recommendations/index-etfs",
        json!({ "data": [{ "symbol": "NIFTYBEES", "recommendation": "BUY" }] }),
    )
    .await;
    // Gold ETF list and its quote chain are both missing.

    let picks = up.service().best_picks().await.unwrap();
    assert_eq!(picks.source, Provenance::Synthetic);
}

#[tokio::test]
async fn test_stock_futures_drop_failed_underlyings() {
    let up = Upstreams::start().await;
    respond(
        &up.upstox,
        "/market/futures/RELIANCE",
        json!({ "data": [
            { "trading_symbol": "RELIANCE24MAYFUT", "expiry": "2024-05-30", "last_price": 2960.0, "percentage_change": 2.5 },
            { "trading_symbol": "RELIANCE24JUNFUT", "expiry": "2024-06-27", "last_price": 2975.0, "percentage_change": 2.4 }
        ] }),
    )
    .await;
    respond(
        &up.upstox,
        "/market/futures/HDFCBANK",
        json!({ "data": [{ "trading_symbol": "HDFCBANK24MAYFUT", "last_price": 1650.0, "percentage_change": -2.5 }] }),
    )
    .await;

    let items = up.service().recommendations(Category::StockFutures).await.unwrap();
    assert_eq!(items.source, Provenance::Live);
    let calls: Vec<(&str, Call)> = items.data.iter().map(|i| (i.symbol.as_str(), i.call)).collect();
    assert_eq!(calls, vec![("RELIANCE24MAYFUT", Call::Buy), ("HDFCBANK24MAYFUT", Call::Sell)]);
}

#[tokio::test]
async fn test_page_falls_back_to_index_list() {
    let up = Upstreams::start().await;
    respond(
        &up.upstox,
        "/market/indices/NSE",
        json!({ "data": [
            { "name": "NIFTY 50", "last_price": 25003.05 },
            { "name": "NIFTY BANK", "last_price": 44312.7 },
            { "name": "SENSEX", "last_price": 65953.48 }
        ] }),
    )
    .await;

    let page = up.service().all_stocks_page(2, 2).await.unwrap();
    assert_eq!(page.source, Provenance::Live);
    assert_eq!(page.data.data.len(), 1);
    assert_eq!(page.data.data[0].symbol, "SENSEX");
    assert_eq!(page.data.pagination.total_pages, 2);
    assert!(page.data.pagination.has_prev);
    assert!(!page.data.pagination.has_next);
}

#[tokio::test]
async fn test_server_paged_body_without_metadata_keeps_rows() {
    let up = Upstreams::start().await;
    Mock::given(method("GET"))
        .and(path("/stocks/all"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
            { "symbol": "C", "price": 3.0 },
            { "symbol": "D", "price": 4.0 }
        ] })))
        .with_priority(1)
        .mount(&up.indian_api)
        .await;
    respond(
        &up.indian_api,
        "/stocks/all",
        json!({ "data": [
            { "symbol": "A", "price": 1.0 },
            { "symbol": "B", "price": 2.0 },
            { "symbol": "C", "price": 3.0 },
            { "symbol": "D", "price": 4.0 }
        ] }),
    )
    .await;

    let page = up.service().all_stocks_page(2, 2).await.unwrap();
    assert_eq!(page.source, Provenance::Live);
    let symbols: Vec<&str> = page.data.data.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["C", "D"]);
    assert_eq!(page.data.pagination.total_pages, 2);
    assert_eq!(page.data.pagination.total_count, 4);
    assert!(!page.data.pagination.has_next);
}

#[tokio::test]
async fn test_etf_list_keeps_rows_missing_from_quotes() {
    let up = Upstreams::start().await;
    respond(
        &up.upstox,
        "/market/quote/multi",
        json!({ "data": { "NSE_EQ:NIFTYBEES": { "last_price": 270.0, "percentage_change": 2.5 } } }),
    )
    .await;

    let etfs = up.service().recommendations(Category::IndexEtfs).await.unwrap();
    assert_eq!(etfs.source, Provenance::Live);
    let rows: Vec<(&str, Option<f64>, Call)> =
        etfs.data.iter().map(|i| (i.symbol.as_str(), i.ltp, i.call)).collect();
    assert_eq!(
        rows,
        vec![
            ("NIFTYBEES", Some(270.0), Call::Buy),
            ("BANKBEES", None, Call::Hold),
            ("JUNIORBEES", None, Call::Hold),
        ]
    );
    assert!(etfs.data.iter().all(|i| i.name.is_some()));
}

#[tokio::test]
async fn test_mutual_funds_have_no_secondary_chain() {
    let up = Upstreams::start().await;
    let funds = up.service().recommendations(Category::MutualFunds).await.unwrap();
    assert_eq!(funds.source, Provenance::Synthetic);
    assert!(funds.data.iter().all(|f| f.nav.is_some() && f.ltp.is_none()));
}

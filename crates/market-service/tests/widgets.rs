mod common;

use common::{failing_service, strict_failing_service};
use market_core::Category;
use market_service::{WidgetKind, WidgetPoller, WidgetState};
use std::time::Duration;

#[tokio::test]
async fn test_snapshot_ready_with_synthetic_data() {
    let snapshot = failing_service().snapshot(WidgetKind::TopMovers).await;
    assert_eq!(snapshot.widget, "top-movers");
    match snapshot.state {
        WidgetState::Ready(body) => {
            assert_eq!(body["gainers"]["source"], "synthetic");
            assert!(body["losers"]["data"].is_array());
        }
        WidgetState::Unavailable(reason) => panic!("unexpected: {}", reason),
    }
}

#[tokio::test]
async fn test_strict_snapshot_is_unavailable() {
    let service = strict_failing_service();
    let snapshot = service.snapshot(WidgetKind::Recommendations(Category::GoldEtf)).await;
    assert!(!snapshot.state.is_ready());

    let status = service.snapshot(WidgetKind::MarketStatus).await;
    match status.state {
        WidgetState::Unavailable(reason) => assert!(reason.contains("market status")),
        WidgetState::Ready(_) => panic!("strict mode must not synthesize"),
    }
}

#[tokio::test]
async fn test_poller_broadcasts_until_shutdown() {
    let (poller, mut rx) = WidgetPoller::new(failing_service());
    let status = poller.spawn_every(WidgetKind::MarketStatus, Duration::from_millis(20));
    let indices = poller.spawn_every(WidgetKind::Indices, Duration::from_millis(20));

    let mut seen = std::collections::HashSet::new();
    while seen.len() < 2 {
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("snapshot within timeout")
            .unwrap();
        assert!(snapshot.state.is_ready());
        seen.insert(snapshot.widget);
    }

    poller.shutdown();
    tokio::time::timeout(Duration::from_secs(5), status).await.unwrap().unwrap();
    tokio::time::timeout(Duration::from_secs(5), indices).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_failing_widget_does_not_block_siblings() {
    let (poller, mut rx) = WidgetPoller::new(strict_failing_service());
    let handle = poller.spawn_every(WidgetKind::BestPicks, Duration::from_millis(20));

    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(snapshot.widget, "best-picks");
    assert!(!snapshot.state.is_ready());

    // The task keeps polling after a failure.
    let again = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(again.widget, "best-picks");

    poller.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
}

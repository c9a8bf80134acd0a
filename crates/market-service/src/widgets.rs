use chrono::{DateTime, Utc};
use market_core::{Category, MarketResult, UserInputError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::adapter::MarketDataService;

/// A dashboard widget backed by one or more adapter calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    MarketStatus,
    Indices,
    TopMovers,
    Week52,
    HighestTraded,
    Sentiment,
    BestPicks,
    AllStocks { page: usize, limit: usize },
    Recommendations(Category),
}

impl WidgetKind {
    /// Widgets shown on the dashboard landing page.
    pub const DASHBOARD: [WidgetKind; 6] = [
        WidgetKind::MarketStatus,
        WidgetKind::Indices,
        WidgetKind::TopMovers,
        WidgetKind::Week52,
        WidgetKind::Sentiment,
        WidgetKind::BestPicks,
    ];

    pub fn name(&self) -> String {
        match self {
            WidgetKind::MarketStatus => "market-status".to_string(),
            WidgetKind::Indices => "indices".to_string(),
            WidgetKind::TopMovers => "top-movers".to_string(),
            WidgetKind::Week52 => "week-52".to_string(),
            WidgetKind::HighestTraded => "highest-traded".to_string(),
            WidgetKind::Sentiment => "sentiment".to_string(),
            WidgetKind::BestPicks => "best-picks".to_string(),
            WidgetKind::AllStocks { .. } => "all-stocks".to_string(),
            WidgetKind::Recommendations(category) => category.slug().to_string(),
        }
    }

    pub fn default_interval(&self) -> Duration {
        let secs = match self {
            WidgetKind::MarketStatus | WidgetKind::Indices => 30,
            WidgetKind::Sentiment => 120,
            _ => 60,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Accepts widget names and recommendation category slugs.
impl FromStr for WidgetKind {
    type Err = UserInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "market-status" => WidgetKind::MarketStatus,
            "indices" => WidgetKind::Indices,
            "top-movers" => WidgetKind::TopMovers,
            "week-52" => WidgetKind::Week52,
            "highest-traded" => WidgetKind::HighestTraded,
            "sentiment" => WidgetKind::Sentiment,
            "best-picks" => WidgetKind::BestPicks,
            "all-stocks" => WidgetKind::AllStocks { page: 1, limit: 50 },
            other => other
                .parse::<Category>()
                .map(WidgetKind::Recommendations)
                .map_err(|_| UserInputError::UnknownWidget(s.to_string()))?,
        };
        Ok(kind)
    }
}

/// What a widget renders: its data, or the reason it shows "No data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum WidgetState {
    Ready(serde_json::Value),
    Unavailable(String),
}

impl WidgetState {
    pub fn is_ready(&self) -> bool {
        matches!(self, WidgetState::Ready(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetSnapshot {
    pub widget: String,
    pub state: WidgetState,
    pub taken_at: DateTime<Utc>,
}

fn ready<T: Serialize>(result: MarketResult<T>) -> WidgetState {
    match result {
        Ok(envelope) => match serde_json::to_value(envelope) {
            Ok(value) => WidgetState::Ready(value),
            Err(e) => WidgetState::Unavailable(e.to_string()),
        },
        Err(e) => WidgetState::Unavailable(e.to_string()),
    }
}

/// Pair of envelopes; unavailable when either side is.
fn ready_pair<A: Serialize, B: Serialize>(first: (&str, MarketResult<A>), second: (&str, MarketResult<B>)) -> WidgetState {
    match (ready(first.1), ready(second.1)) {
        (WidgetState::Ready(a), WidgetState::Ready(b)) => {
            let mut body = serde_json::Map::new();
            body.insert(first.0.to_string(), a);
            body.insert(second.0.to_string(), b);
            WidgetState::Ready(serde_json::Value::Object(body))
        }
        (WidgetState::Unavailable(e), _) | (_, WidgetState::Unavailable(e)) => WidgetState::Unavailable(e),
    }
}

impl MarketDataService {
    /// Fetch everything one widget shows. Failures stay inside the snapshot.
    pub async fn snapshot(&self, kind: WidgetKind) -> WidgetSnapshot {
        let state = match kind {
            WidgetKind::MarketStatus => ready(self.market_status().await),
            WidgetKind::Indices => ready(self.indices().await),
            WidgetKind::TopMovers => {
                let (gainers, losers) = tokio::join!(self.top_gainers(), self.top_losers());
                ready_pair(("gainers", gainers), ("losers", losers))
            }
            WidgetKind::Week52 => {
                let (highs, lows) = tokio::join!(self.week_52_highs(), self.week_52_lows());
                ready_pair(("highs", highs), ("lows", lows))
            }
            WidgetKind::HighestTraded => ready(self.highest_traded().await),
            WidgetKind::Sentiment => ready(self.index_outlook().await),
            WidgetKind::BestPicks => ready(self.best_picks().await),
            WidgetKind::AllStocks { page, limit } => ready(self.all_stocks_page(page, limit).await),
            WidgetKind::Recommendations(category) => ready(self.recommendations(category).await),
        };

        if let WidgetState::Unavailable(reason) = &state {
            tracing::warn!("widget {} has no data: {}", kind, reason);
        }
        WidgetSnapshot { widget: kind.name(), state, taken_at: Utc::now() }
    }
}

/// Refreshes widgets on their own intervals and broadcasts the snapshots.
///
/// Each spawned widget runs in its own task, so a slow or failing widget never
/// delays the others. [`WidgetPoller::shutdown`] stops every task after its
/// current refresh.
pub struct WidgetPoller {
    service: MarketDataService,
    tx: broadcast::Sender<WidgetSnapshot>,
    stopping: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl WidgetPoller {
    pub fn new(service: MarketDataService) -> (Self, broadcast::Receiver<WidgetSnapshot>) {
        let (tx, rx) = broadcast::channel(256);
        let poller = Self {
            service,
            tx,
            stopping: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        };
        (poller, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetSnapshot> {
        self.tx.subscribe()
    }

    pub fn spawn(&self, kind: WidgetKind) -> JoinHandle<()> {
        self.spawn_every(kind, kind.default_interval())
    }

    /// Poll `kind` immediately and then every `every`.
    pub fn spawn_every(&self, kind: WidgetKind, every: Duration) -> JoinHandle<()> {
        let service = self.service.clone();
        let tx = self.tx.clone();
        let stopping = self.stopping.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("polling {} every {:?}", kind, every);

            while !stopping.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = ticker.tick() => {
                        let snapshot = service.snapshot(kind).await;
                        tracing::info!("{} refreshed (ready: {})", kind, snapshot.state.is_ready());
                        // No subscribers is not an error for the poller.
                        let _ = tx.send(snapshot);
                    }
                    _ = shutdown.notified() => break,
                }
            }
            tracing::info!("stopped polling {}", kind);
        })
    }

    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_names_parse_back() {
        for kind in WidgetKind::DASHBOARD {
            assert_eq!(kind.name().parse::<WidgetKind>().unwrap(), kind);
        }
        assert_eq!(
            "gold-etf".parse::<WidgetKind>().unwrap(),
            WidgetKind::Recommendations(Category::GoldEtf)
        );
        assert_eq!(
            "ALL-STOCKS".parse::<WidgetKind>().unwrap(),
            WidgetKind::AllStocks { page: 1, limit: 50 }
        );
        assert!(matches!(
            "heatmap".parse::<WidgetKind>(),
            Err(UserInputError::UnknownWidget(_))
        ));
    }

    #[test]
    fn test_intervals_within_refresh_range() {
        for kind in WidgetKind::DASHBOARD {
            let secs = kind.default_interval().as_secs();
            assert!((30..=120).contains(&secs), "{} polls every {}s", kind, secs);
        }
        assert_eq!(WidgetKind::Sentiment.default_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_widget_state_wire_shape() {
        let state = WidgetState::Unavailable("upstream down".to_string());
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["status"], "unavailable");
        assert_eq!(value["body"], "upstream down");
    }
}

//! market-feed: print dashboard widget snapshots as JSON.
//!
//! Without `--watch` every selected widget is fetched once. With `--watch`
//! each widget polls on its own interval until Ctrl-C.
//!
//! Usage:
//!   cargo run -p market-feed
//!   cargo run -p market-feed -- --widget sentiment --widget gold-etf
//!   cargo run -p market-feed -- --widget all-stocks --page 2 --limit 25
//!   cargo run -p market-feed -- --watch

use market_core::Category;
use market_service::{MarketConfig, MarketDataService, WidgetKind, WidgetPoller, WidgetSnapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_feed=info,market_service=info,market_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let watch = args.iter().any(|a| a == "--watch");

    let page: usize = flag_value(&args, "--page").unwrap_or(1);
    let limit: usize = flag_value(&args, "--limit").unwrap_or(50);

    let mut widgets = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if arg != "--widget" {
            continue;
        }
        let Some(name) = args.get(i + 1) else {
            anyhow::bail!("--widget needs a name");
        };
        let kind = match name.parse::<WidgetKind>()? {
            WidgetKind::AllStocks { .. } => WidgetKind::AllStocks { page, limit },
            other => other,
        };
        widgets.push(kind);
    }
    if widgets.is_empty() {
        widgets.extend(WidgetKind::DASHBOARD);
        widgets.extend(Category::ALL.into_iter().map(WidgetKind::Recommendations));
    }

    let config = MarketConfig::from_env();
    tracing::info!(
        "Upstox at {}, IndianAPI at {}, fallback {:?}",
        config.upstox.base_url,
        config.indian_api.base_url,
        config.fallback
    );
    let service = MarketDataService::from_config(config);

    if !watch {
        for kind in widgets {
            print_snapshot(&service.snapshot(kind).await)?;
        }
        return Ok(());
    }

    let (poller, mut rx) = WidgetPoller::new(service);
    let handles: Vec<_> = widgets.iter().map(|kind| poller.spawn(*kind)).collect();
    tracing::info!("Watching {} widgets, Ctrl-C to stop", handles.len());

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(snapshot) => print_snapshot(&snapshot)?,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Output fell behind, {} snapshots skipped", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    poller.shutdown();
    for handle in handles {
        handle.await?;
    }
    Ok(())
}

fn flag_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn print_snapshot(snapshot: &WidgetSnapshot) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(snapshot)?);
    Ok(())
}

//! Market data adapter for the NSE dashboard.
//!
//! [`MarketDataService`] is the only way widgets read market data. Every read
//! returns an [`market_core::Envelope`] whose `source` says whether the payload
//! is live or synthetic.

pub mod adapter;
pub mod config;
pub mod recommendations;
pub mod synthetic;
pub mod widgets;

pub use adapter::{MarketDataService, Query};
pub use config::{FallbackMode, MarketConfig};
pub use synthetic::SyntheticData;
pub use widgets::{WidgetKind, WidgetPoller, WidgetSnapshot, WidgetState};

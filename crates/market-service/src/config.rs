use market_client::ProviderConfig;
use market_core::RecommendationConfig;
use std::time::Duration;

/// What the adapter does when every real attempt for a query has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Substitute synthetic data labelled [`market_core::Provenance::Synthetic`].
    #[default]
    Synthetic,
    /// Return [`market_core::MarketDataError::DataUnavailable`].
    Strict,
}

/// Process-wide configuration, built once at startup and injected.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub upstox: ProviderConfig,
    pub indian_api: ProviderConfig,
    pub fallback: FallbackMode,
    /// Perturb synthetic values randomly; off gives fixed baselines.
    pub synthetic_jitter: bool,
    pub recommendations: RecommendationConfig,
}

impl MarketConfig {
    /// Synthetic fallback, no jitter and default recommendation rules.
    pub fn new(upstox: ProviderConfig, indian_api: ProviderConfig) -> Self {
        Self {
            upstox,
            indian_api,
            fallback: FallbackMode::Synthetic,
            synthetic_jitter: false,
            recommendations: RecommendationConfig::default(),
        }
    }

    pub fn from_env() -> Self {
        let timeout = std::env::var("MARKET_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let fallback = if env_flag("MARKET_STRICT") {
            FallbackMode::Strict
        } else {
            FallbackMode::Synthetic
        };

        Self {
            upstox: ProviderConfig::upstox_from_env().with_timeout(timeout),
            indian_api: ProviderConfig::indian_api_from_env().with_timeout(timeout),
            fallback,
            synthetic_jitter: env_flag("MARKET_SYNTHETIC_JITTER"),
            recommendations: RecommendationConfig::default(),
        }
    }

    pub fn strict(mut self) -> Self {
        self.fallback = FallbackMode::Strict;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.synthetic_jitter = jitter;
        self
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_client::AuthScheme;

    #[test]
    fn test_new_defaults_to_synthetic_fallback() {
        let config = MarketConfig::new(
            ProviderConfig::new("upstox", "http://localhost:1", AuthScheme::None),
            ProviderConfig::new("indian_api", "http://localhost:2", AuthScheme::None),
        );
        assert_eq!(config.fallback, FallbackMode::Synthetic);
        assert!(!config.synthetic_jitter);
        assert_eq!(config.strict().fallback, FallbackMode::Strict);
    }

    #[test]
    fn test_env_flag_values() {
        std::env::set_var("MARKET_TEST_FLAG_ON", "Yes");
        std::env::set_var("MARKET_TEST_FLAG_OFF", "0");
        assert!(env_flag("MARKET_TEST_FLAG_ON"));
        assert!(!env_flag("MARKET_TEST_FLAG_OFF"));
        assert!(!env_flag("MARKET_TEST_FLAG_UNSET"));
    }
}

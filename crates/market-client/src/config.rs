use std::time::Duration;

/// How a provider expects credentials on each request.
///
/// The two upstreams have used both bearer tokens and custom key headers
/// across revisions, so this is per-provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer(String),
    ApiKeyHeader { header: String, key: String },
    None,
}

impl AuthScheme {
    /// Bearer unless `header` names a custom header; empty credentials mean no auth.
    pub fn from_parts(key: Option<String>, header: Option<String>) -> Self {
        match (key.filter(|k| !k.is_empty()), header.filter(|h| !h.is_empty())) {
            (None, _) => AuthScheme::None,
            (Some(key), None) => AuthScheme::Bearer(key),
            (Some(key), Some(h)) if h.eq_ignore_ascii_case("authorization") => AuthScheme::Bearer(key),
            (Some(key), Some(header)) => AuthScheme::ApiKeyHeader { header, key },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: &'static str,
    pub base_url: String,
    pub auth: AuthScheme,
    /// Requests allowed per `rate_window`.
    pub rate_limit: usize,
    pub rate_window: Duration,
    pub timeout: Duration,
    /// Pause before retrying after an HTTP 429.
    pub retry_wait: Duration,
    pub max_attempts: u32,
}

impl ProviderConfig {
    pub fn new(name: &'static str, base_url: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            rate_limit: 250,
            rate_window: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            retry_wait: Duration::from_secs(15),
            max_attempts: 3,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: usize) -> Self {
        self.rate_limit = rate_limit.max(1);
        self
    }

    pub fn with_retry_wait(mut self, retry_wait: Duration) -> Self {
        self.retry_wait = retry_wait;
        self
    }

    /// Provider A: quotes, indices, movers, options, futures, candles.
    pub fn upstox_from_env() -> Self {
        let token = std::env::var("UPSTOX_ACCESS_TOKEN").ok();
        let base_url = std::env::var("UPSTOX_BASE_URL")
            .unwrap_or_else(|_| "https://api.upstox.com/v2".to_string());
        let rate_limit: usize = std::env::var("UPSTOX_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(250);

        Self::new("upstox", base_url, AuthScheme::from_parts(token, None)).with_rate_limit(rate_limit)
    }

    /// Provider B: search, movers, 52-week lists, recommendations, mutual funds.
    pub fn indian_api_from_env() -> Self {
        let key = std::env::var("INDIAN_API_KEY").ok();
        let header = std::env::var("INDIAN_API_AUTH_HEADER").ok();
        let base_url = std::env::var("INDIAN_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.indianapi.in".to_string());
        let rate_limit: usize = std::env::var("INDIAN_API_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self::new("indian_api", base_url, AuthScheme::from_parts(key, header)).with_rate_limit(rate_limit)
    }
}

use market_core::{FetchError, FetchResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{AuthScheme, ProviderConfig};

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
/// Clones share the same window.
#[derive(Clone)]
pub(crate) struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub(crate) fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    pub(crate) async fn acquire(&self, provider: &str) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let Some(&oldest) = ts.front() else {
                ts.push_back(now);
                return;
            };
            let sleep_dur = (oldest + self.window).duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for {} slot", sleep_dur.as_secs_f64(), provider);
            tokio::time::sleep(sleep_dur).await;
        }
    }

    #[cfg(test)]
    async fn in_flight(&self) -> usize {
        self.timestamps.lock().await.len()
    }
}

/// HTTP plumbing shared by both provider clients: auth headers, rate
/// limiting, 429 retry and mapping failures onto [`FetchError`].
#[derive(Clone)]
pub(crate) struct ProviderHttp {
    client: Client,
    config: ProviderConfig,
    rate_limiter: RateLimiter,
}

impl ProviderHttp {
    pub(crate) fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(config.rate_limit, config.rate_window),
            config,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.config.name
    }

    fn auth_headers(&self) -> FetchResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        match &self.config.auth {
            AuthScheme::Bearer(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| FetchError::Transport(format!("invalid bearer token: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
            }
            AuthScheme::ApiKeyHeader { header, key } => {
                let name = HeaderName::from_bytes(header.as_bytes())
                    .map_err(|e| FetchError::Transport(format!("invalid auth header name: {}", e)))?;
                let value = HeaderValue::from_str(key)
                    .map_err(|e| FetchError::Transport(format!("invalid api key: {}", e)))?;
                headers.insert(name, value);
            }
            AuthScheme::None => {}
        }

        Ok(headers)
    }

    /// Send a GET with rate limiting and automatic 429 retry.
    async fn send_request(&self, url: &str, query: &[(&str, String)]) -> FetchResult<reqwest::Response> {
        let request = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .query(query)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let attempts = self.config.max_attempts.max(1);
        for attempt in 0..attempts {
            self.rate_limiter.acquire(self.name()).await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| FetchError::Transport("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            if attempt + 1 == attempts {
                tracing::warn!("{} 429 rate limited, giving up after {} attempts", self.name(), attempts);
                break;
            }

            tracing::warn!(
                "{} 429 rate limited, waiting {}s before retry {}/{}",
                self.name(),
                self.config.retry_wait.as_secs(),
                attempt + 1,
                attempts
            );
            tokio::time::sleep(self.config.retry_wait).await;
        }

        Err(FetchError::RateLimited { attempts })
    }

    /// GET `{base_url}{path}` and decode the body as `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> FetchResult<T> {
        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("{} request: {}", self.name(), url);

        let response = self.send_request(&url, query).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::UpstreamStatus { code: status.as_u16(), body });
        }

        serde_json::from_str(&body).map_err(|e| {
            FetchError::MalformedResponse(format!("{} {}: {}", self.name(), path, e))
        })
    }
}

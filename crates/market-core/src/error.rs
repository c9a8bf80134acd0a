use thiserror::Error;

/// Failure of a single real attempt against an upstream provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned HTTP {code}: {body}")]
    UpstreamStatus { code: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
}

impl FetchError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::UpstreamStatus { code, .. } => Some(*code),
            FetchError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Invalid caller input (page numbers, empty symbols, unknown names).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserInputError {
    #[error("Page numbers start at 1, got {0}")]
    InvalidPage(usize),

    #[error("Page size must be positive")]
    InvalidPageSize,

    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Unknown recommendation category: {0}")]
    UnknownCategory(String),

    #[error("Unknown widget: {0}")]
    UnknownWidget(String),
}

#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Raised instead of synthesizing fallback data when strict mode is on.
    #[error("Data unavailable for {query}: {source}")]
    DataUnavailable {
        query: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    UserInput(#[from] UserInputError),
}

pub type MarketResult<T> = Result<T, MarketDataError>;
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_is_exposed() {
        let err = FetchError::UpstreamStatus { code: 503, body: String::new() };
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(FetchError::RateLimited { attempts: 3 }.status_code(), Some(429));
        assert_eq!(FetchError::Transport("refused".into()).status_code(), None);
    }

    #[test]
    fn test_data_unavailable_message_names_query() {
        let err = MarketDataError::DataUnavailable {
            query: "quote RELIANCE".to_string(),
            source: FetchError::MalformedResponse("missing data".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("quote RELIANCE"));
        assert!(msg.contains("missing data"));
    }
}

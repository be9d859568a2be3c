//! Feed error types.

use thiserror::Error;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors that can occur while talking to the feed API.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Rate limited")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeedError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::AuthError(message),
            429 => Self::RateLimited {
                retry_after_ms: None,
            },
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::RateLimited { .. } | FeedError::ServerError(..) => true,
            FeedError::Network(e) => !e.is_decode() && !e.is_builder(),
            _ => false,
        }
    }

    /// Delay requested by the server, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            FeedError::RateLimited { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FeedError::ServerError(status, _) => Some(*status),
            FeedError::RateLimited { .. } => Some(429),
            FeedError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_http_status_429() {
        let err = FeedError::from_http_status(429, "slow down");
        assert!(matches!(err, FeedError::RateLimited { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), Some(429));
    }

    #[test]
    fn test_error_from_http_status_5xx() {
        for status in [500, 502, 503] {
            let err = FeedError::from_http_status(status, "upstream");
            assert!(matches!(err, FeedError::ServerError(s, _) if s == status));
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_error_from_http_status_auth() {
        let err = FeedError::from_http_status(401, "bad token");
        assert!(matches!(err, FeedError::AuthError(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_from_http_status_404() {
        let err = FeedError::from_http_status(404, "no such community");
        assert!(matches!(err, FeedError::RequestFailed(_)));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_retry_after() {
        let err = FeedError::RateLimited {
            retry_after_ms: Some(1500),
        };
        assert_eq!(err.retry_after_ms(), Some(1500));
        assert_eq!(FeedError::request_failed("x").retry_after_ms(), None);
    }
}

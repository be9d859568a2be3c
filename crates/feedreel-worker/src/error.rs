//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Invalid options, detected before any network activity
    #[error("Configuration error: {0}")]
    Config(String),

    /// The final compilation render failed
    #[error("Render failed: {0}")]
    Render(String),

    #[error("Feed error: {0}")]
    Feed(#[from] feedreel_feed::FeedError),

    #[error("Media error: {0}")]
    Media(#[from] feedreel_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, WorkerError::Config(_))
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkerError::Config(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(WorkerError::config_error("count must be > 0").exit_code(), 2);
        assert_eq!(WorkerError::render_failed("xfade").exit_code(), 1);
        let io = WorkerError::from(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), 1);
        assert!(!io.is_config());
    }
}

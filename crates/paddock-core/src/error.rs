//! Error types for Paddock

use thiserror::Error;

/// Result type alias for Paddock operations
pub type PaddockResult<T> = Result<T, PaddockError>;

/// Main error type for Paddock
#[derive(Error, Debug)]
pub enum PaddockError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Policy error: {0}")]
    Policy(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Injection error: {0}")]
    Injection(String),

    #[error("WebView error: {0}")]
    WebView(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PaddockError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new policy error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Create a new history error
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Create a new injection error
    pub fn injection(msg: impl Into<String>) -> Self {
        Self::Injection(msg.into())
    }

    /// Create a new WebView error
    pub fn webview(msg: impl Into<String>) -> Self {
        Self::WebView(msg.into())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpiderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}")]
    StatusError { url: String, status: reqwest::StatusCode },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid blacklist pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SpiderError>;

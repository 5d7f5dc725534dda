use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    /// The article page had no paragraph to take a body from.
    #[error("No content found at {url}")]
    NoContent { url: String },

    #[error("Unsupported output format '{0}': expected .csv, .xlsx or .json")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: reqwest::StatusCode },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Timeouts, 429 and 5xx answers are worth another attempt; everything
    /// else (4xx, DNS or connection failures, bad input) is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => {
                e.is_timeout() || e.status().map_or(false, is_retryable_status)
            }
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub type Result<T> = std::result::Result<T, Error>;

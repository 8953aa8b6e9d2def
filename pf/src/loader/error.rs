//! Loader error types

use thiserror::Error;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Relative URL '{url}' requires a configured base-url")]
    MissingBaseUrl { url: String },

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("No document for {url}")]
    NoDocument { url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LoaderError {
    /// Check if another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LoaderError::Status { status, .. } => *status >= 500 || *status == 429,
            LoaderError::Network(_) => true,
            LoaderError::InvalidUrl { .. }
            | LoaderError::MissingBaseUrl { .. }
            | LoaderError::TooLarge { .. }
            | LoaderError::NoDocument { .. } => false,
        }
    }
}

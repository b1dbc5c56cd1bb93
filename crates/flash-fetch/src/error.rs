//! Firmware fetch errors

use thiserror::Error;

/// Errors retrieving the firmware image
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid image URL
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success HTTP status; `text` is the status text verbatim
    #[error("Fetch failed ({status}): {text}")]
    Status { status: u16, text: String },
}

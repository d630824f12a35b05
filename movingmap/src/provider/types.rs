//! Provider error and body types

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

/// Errors that can occur while downloading a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed before a response arrived
    HttpError(String),
    /// Server answered with a non-success status
    Status { url: String, status: u16 },
    /// Response body failed mid-transfer
    Body(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::Status { url, status } => write!(f, "HTTP {} from {}", status, url),
            ProviderError::Body(msg) => write!(f, "Failed to read response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Streamed response body.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProviderError>> + Send>>;

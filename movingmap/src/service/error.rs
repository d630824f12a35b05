//! Service error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::provider::ProviderError;

/// Errors that can occur while starting the tile service.
///
/// Once running, the service never reports errors to the renderer.
#[derive(Debug)]
pub enum ServiceError {
    /// Failed to create the HTTP client
    HttpClientError(ProviderError),
    /// Failed to create the cache root directory
    CacheDirectory { path: PathBuf, source: io::Error },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpClientError(e) => write!(f, "HTTP client error: {}", e),
            Self::CacheDirectory { path, source } => {
                write!(
                    f,
                    "Failed to create cache directory {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClientError(e) => Some(e),
            Self::CacheDirectory { source, .. } => Some(source),
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(e: ProviderError) -> Self {
        Self::HttpClientError(e)
    }
}

//! Fetch worker errors.

use thiserror::Error;

use crate::cache::CacheError;
use crate::provider::ProviderError;

/// Reasons a background tile fetch can fail.
///
/// These never reach the renderer. The worker logs them and releases the key,
/// and the tile stays pending until a later frame requests it again.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request or body transfer failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Storing the body on disk failed.
    #[error("{0}")]
    Cache(#[from] CacheError),

    /// The concurrency limiter was closed while waiting for a permit.
    #[error("Fetch limiter closed")]
    LimiterClosed,
}

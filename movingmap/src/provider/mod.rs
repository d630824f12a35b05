//! Remote tile source.
//!
//! One fixed server is queried with `GET https://{host}/{z}/{x}/{y}.png`.
//! [`AsyncHttpClient`] abstracts the transport so fetch workers can be driven
//! by a mock in tests.

mod http;
mod types;

pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use types::{BodyStream, ProviderError};

/// Default tile server host.
pub const DEFAULT_TILE_HOST: &str = "tile.openstreetmap.org";

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

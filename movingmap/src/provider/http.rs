//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use futures::TryStreamExt;
use tracing::{debug, trace, warn};

use super::types::{BodyStream, ProviderError};
use crate::USER_AGENT;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for asynchronous HTTP GET with a streamed body.
///
/// Fetch workers depend on this trait rather than on reqwest directly so the
/// network can be replaced in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs a GET and returns the body as a stream of chunks.
    ///
    /// A non-success status is reported as [`ProviderError::Status`] before
    /// any body is read.
    fn get_stream(&self, url: &str)
        -> impl Future<Output = Result<BodyStream, ProviderError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the crate user agent and the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_options(USER_AGENT, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
    }

    /// Creates a client with a custom user agent and timeout.
    ///
    /// `timeout` of `None` waits indefinitely.
    pub fn with_options(
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            ProviderError::HttpError(format!("Failed to create async HTTP client: {}", e))
        })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get_stream(&self, url: &str) -> Result<BodyStream, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(ProviderError::HttpError(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes_stream()
            .map_err(|e| ProviderError::Body(e.to_string()));
        Ok(Box::pin(body))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::StreamExt;

    /// Mock async HTTP client serving a fixed response.
    #[derive(Clone)]
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<Vec<u8>>, ProviderError>,
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get_stream(&self, _url: &str) -> Result<BodyStream, ProviderError> {
            let chunks = self.response.clone()?;
            let stream = futures::stream::iter(
                chunks
                    .into_iter()
                    .map(|c| Ok::<_, ProviderError>(Bytes::from(c))),
            );
            Ok(Box::pin(stream))
        }
    }

    #[tokio::test]
    async fn test_mock_client_streams_chunks() {
        let mock = MockAsyncHttpClient {
            response: Ok(vec![vec![1, 2], vec![3, 4]]),
        };

        let body: Vec<Bytes> = mock
            .get_stream("http://example.com")
            .await
            .unwrap()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(body.concat(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockAsyncHttpClient {
            response: Err(ProviderError::HttpError("Test error".to_string())),
        };

        assert!(mock.get_stream("http://example.com").await.is_err());
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new().is_ok());
        assert!(ReqwestClient::with_options("test-agent/1.0", None).is_ok());
    }
}

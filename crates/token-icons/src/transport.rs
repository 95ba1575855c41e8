//! HTTP seam used by the network-backed sources.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;

/// Minimal HTTP capability the sources need.
///
/// Implementations enforce their own per-request timeout.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Existence check; returns the response status code.
    async fn head(&self, url: &str) -> Result<u16, SourceError>;

    /// GET a JSON document. Non-2xx responses are errors.
    async fn get_json(&self, url: &str) -> Result<Value, SourceError>;
}

#[cfg(feature = "http")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "http")]
mod reqwest_transport {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::Value;
    use tracing::trace;

    use super::HttpTransport;
    use crate::error::{Error, SourceError};

    /// `reqwest`-backed transport with a client-wide timeout.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Duration) -> Result<Self, Error> {
            let client = Client::builder()
                .timeout(timeout)
                .user_agent(concat!("token-icons/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| Error::Transport(e.to_string()))?;
            Ok(Self { client })
        }
    }

    fn map_err(e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_decode() {
            SourceError::Parse(e.to_string())
        } else {
            SourceError::Http(e.to_string())
        }
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn head(&self, url: &str) -> Result<u16, SourceError> {
            trace!(url, "HEAD");
            let response = self.client.head(url).send().await.map_err(map_err)?;
            Ok(response.status().as_u16())
        }

        async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
            trace!(url, "GET");
            let response = self.client.get(url).send().await.map_err(map_err)?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status(status.as_u16()));
            }

            response.json::<Value>().await.map_err(map_err)
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use self::mock::MockTransport;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::HttpTransport;
    use crate::error::SourceError;

    #[derive(Debug, Clone)]
    enum Canned {
        Status(u16),
        Json(Value),
        Fail(SourceError),
    }

    /// In-memory transport for tests.
    ///
    /// Unknown URLs answer 404. Every request URL is recorded, and each
    /// request yields once so concurrent callers interleave.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        heads: Mutex<HashMap<String, Canned>>,
        gets: Mutex<HashMap<String, Canned>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_head(self, url: &str, status: u16) -> Self {
            self.heads
                .lock()
                .unwrap()
                .insert(url.to_string(), Canned::Status(status));
            self
        }

        pub fn with_json(self, url: &str, body: Value) -> Self {
            self.gets
                .lock()
                .unwrap()
                .insert(url.to_string(), Canned::Json(body));
            self
        }

        pub fn with_get_status(self, url: &str, status: u16) -> Self {
            self.gets
                .lock()
                .unwrap()
                .insert(url.to_string(), Canned::Status(status));
            self
        }

        pub fn with_failure(self, url: &str, error: SourceError) -> Self {
            self.gets
                .lock()
                .unwrap()
                .insert(url.to_string(), Canned::Fail(error.clone()));
            self.heads
                .lock()
                .unwrap()
                .insert(url.to_string(), Canned::Fail(error));
            self
        }

        /// URLs requested so far, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == url)
                .count()
        }

        pub fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        async fn record(&self, url: &str) {
            self.calls.lock().unwrap().push(url.to_string());
            tokio::task::yield_now().await;
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn head(&self, url: &str) -> Result<u16, SourceError> {
            self.record(url).await;
            let canned = self.heads.lock().unwrap().get(url).cloned();
            match canned {
                Some(Canned::Status(status)) => Ok(status),
                Some(Canned::Json(_)) => Ok(200),
                Some(Canned::Fail(e)) => Err(e),
                None => Ok(404),
            }
        }

        async fn get_json(&self, url: &str) -> Result<Value, SourceError> {
            self.record(url).await;
            let canned = self.gets.lock().unwrap().get(url).cloned();
            match canned {
                Some(Canned::Json(body)) => Ok(body),
                Some(Canned::Status(status)) => Err(SourceError::Status(status)),
                Some(Canned::Fail(e)) => Err(e),
                None => Err(SourceError::Status(404)),
            }
        }
    }
}

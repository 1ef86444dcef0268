//! Raw HTTP exchange — the seam between the transport and the network.
//!
//! [`HttpSender`] performs exactly one HTTP exchange and knows nothing about
//! envelopes, signing or retries. [`ReqwestSender`] is the production sender.

use async_trait::async_trait;
use thiserror::Error;

use crate::error::BoxError;
use crate::http::request::Method;

/// A fully built request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Vec<u8>>,
}

impl RawRequest {
    /// First header with the given (lowercase) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A received response, whatever its status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Canonical reason phrase for the status, if known.
    pub reason: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: None,
            body: body.into(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Failure to complete an HTTP exchange.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("request timed out: {0}")]
    Timeout(#[source] BoxError),

    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),

    #[error("request could not be built: {0}")]
    Build(#[source] BoxError),

    #[error("I/O error: {0}")]
    Io(#[source] BoxError),
}

impl SendError {
    /// Whether resending the same request might succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SendError::Build(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SendError::Timeout(_))
    }
}

/// Performs one HTTP exchange.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, SendError>;
}

#[cfg(feature = "http")]
pub use self::reqwest_sender::ReqwestSender;

#[cfg(feature = "http")]
mod reqwest_sender {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;

    use super::{HttpSender, RawRequest, RawResponse, SendError};
    use crate::error::ConfigError;
    use crate::http::request::Method;

    /// [`HttpSender`] over a pooled `reqwest::Client`.
    #[derive(Debug, Clone)]
    pub struct ReqwestSender {
        client: Client,
    }

    impl ReqwestSender {
        /// `timeout` bounds the connect phase and each read independently.
        pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
            let client = Client::builder()
                .connect_timeout(timeout)
                .read_timeout(timeout)
                .pool_max_idle_per_host(10)
                .build()
                .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
            Ok(Self { client })
        }

        pub fn from_client(client: Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl HttpSender for ReqwestSender {
        async fn send(&self, request: RawRequest) -> Result<RawResponse, SendError> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
            };

            let mut req = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                req = req.header(*name, value.as_str());
            }
            if let Some(body) = request.body {
                req = req.body(body);
            }

            let resp = req.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;

            Ok(RawResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                body: body.to_vec(),
            })
        }
    }

    impl From<reqwest::Error> for SendError {
        fn from(e: reqwest::Error) -> Self {
            if e.is_builder() {
                SendError::Build(Box::new(e))
            } else if e.is_timeout() || timed_out_io(&e) {
                SendError::Timeout(Box::new(e))
            } else if e.is_connect() {
                SendError::Connect(Box::new(e))
            } else {
                SendError::Io(Box::new(e))
            }
        }
    }

    // Read timeouts surface as an io::Error deep in the source chain.
    fn timed_out_io(e: &reqwest::Error) -> bool {
        let mut source = std::error::Error::source(e);
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                if io.kind() == std::io::ErrorKind::TimedOut {
                    return true;
                }
            }
            source = err.source();
        }
        false
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_errors_are_not_transient() {
        let io = || Box::new(std::io::Error::other("x")) as BoxError;
        assert!(!SendError::Build(io()).is_transient());
        assert!(SendError::Timeout(io()).is_transient());
        assert!(SendError::Timeout(io()).is_timeout());
        assert!(SendError::Connect(io()).is_transient());
        assert!(SendError::Io(io()).is_transient());
    }

    #[test]
    fn test_raw_request_header_lookup() {
        let req = RawRequest {
            method: Method::Get,
            url: "http://localhost/v2/groups".into(),
            headers: vec![("x-version", "2.83.0".into())],
            body: None,
        };
        assert_eq!(req.header("x-version"), Some("2.83.0"));
        assert_eq!(req.header("x-signature"), None);
    }
}

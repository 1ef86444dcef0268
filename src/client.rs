//! High-level client — `ZsxqClient` and its builder.
//!
//! Resource modules (groups, topics, checkins, ...) describe a request as a
//! [`RequestDescriptor`] and hand it to [`ZsxqClient::execute`], or use the
//! `get`/`post`/`put`/`delete` shorthands for the common cases.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::error::SdkError;
use crate::http::{HttpSender, RequestDescriptor, Sleeper, Transport};

#[cfg(feature = "http")]
use crate::http::{ReqwestSender, TimerSleeper};

/// The primary entry point for the ZSXQ SDK.
///
/// Cheap to clone; clones share the config and the connection pool.
#[derive(Clone)]
pub struct ZsxqClient {
    transport: Transport,
}

impl ZsxqClient {
    pub fn builder() -> ZsxqClientBuilder {
        ZsxqClientBuilder::default()
    }

    /// Client with the reqwest sender and timer-based backoff.
    #[cfg(feature = "http")]
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        let sender = ReqwestSender::new(config.timeout())?;
        Ok(Self::from_transport(Transport::new(
            Arc::new(config),
            Arc::new(sender),
            Arc::new(TimerSleeper),
        )))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Run a request and decode `resp_data` into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Option<T>, SdkError> {
        Ok(self.transport.execute(request).await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SdkError> {
        self.execute(RequestDescriptor::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, SdkError> {
        self.execute(RequestDescriptor::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, SdkError> {
        self.execute(RequestDescriptor::put(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SdkError> {
        self.execute(RequestDescriptor::delete(path)).await
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ZsxqClientBuilder {
    config: ClientConfigBuilder,
    sender: Option<Arc<dyn HttpSender>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl ZsxqClientBuilder {
    /// Start from an existing config builder, e.g. [`ClientConfigBuilder::from_env`].
    pub fn config(mut self, config: ClientConfigBuilder) -> Self {
        self.config = config;
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.token(token);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.base_url(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    pub fn retry(mut self, count: u32, delay: Duration) -> Self {
        self.config = self.config.retry(count, delay);
        self
    }

    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.config = self.config.device_id(id);
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config = self.config.app_version(version);
        self
    }

    pub fn signing_key(mut self, key: impl Into<String>) -> Self {
        self.config = self.config.signing_key(key);
        self
    }

    pub fn signing_enabled(mut self, enabled: bool) -> Self {
        self.config = self.config.signing_enabled(enabled);
        self
    }

    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.config = self.config.retry_writes(enabled);
        self
    }

    /// Replace the HTTP sender (for proxies, custom TLS, or tests).
    pub fn sender(mut self, sender: Arc<dyn HttpSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Replace the backoff sleeper.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    #[cfg(feature = "http")]
    pub fn build(self) -> Result<ZsxqClient, SdkError> {
        let config = self.config.build()?;
        let sender: Arc<dyn HttpSender> = match self.sender {
            Some(s) => s,
            None => Arc::new(ReqwestSender::new(config.timeout())?),
        };
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TimerSleeper));
        Ok(ZsxqClient::from_transport(Transport::new(
            Arc::new(config),
            sender,
            sleeper,
        )))
    }

    /// Build with an explicit sender and sleeper; no default HTTP stack needed.
    #[cfg(not(feature = "http"))]
    pub fn build(self) -> Result<ZsxqClient, SdkError> {
        let config = self.config.build()?;
        let (Some(sender), Some(sleeper)) = (self.sender, self.sleeper) else {
            return Err(SdkError::Config(crate::error::ConfigError::HttpClient(
                "a sender and a sleeper are required without the `http` feature".into(),
            )));
        };
        Ok(ZsxqClient::from_transport(Transport::new(
            Arc::new(config),
            sender,
            sleeper,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ConfigError, ErrorKind};
    use crate::http::{RawRequest, RawResponse, SendError};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedSender {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<RawRequest>>,
    }

    impl FixedSender {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpSender for FixedSender {
        async fn send(&self, request: RawRequest) -> Result<RawResponse, SendError> {
            self.seen.lock().unwrap().push(request);
            Ok(RawResponse::new(self.status, self.body))
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn client(sender: Arc<FixedSender>) -> ZsxqClient {
        ZsxqClient::builder()
            .token("tok")
            .base_url("http://api.test")
            .retry(2, Duration::from_millis(1))
            .sender(sender)
            .sleeper(Arc::new(NoSleep))
            .build()
            .unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct User {
        user_id: i64,
        name: String,
    }

    #[tokio::test]
    async fn test_get_decodes_struct() {
        let sender = FixedSender::new(
            200,
            r#"{"succeeded":true,"resp_data":{"user_id":5,"name":"Lin","avatar_url":"x"}}"#,
        );
        let user: User = client(sender).get("/v3/users/self").await.unwrap().unwrap();
        assert_eq!(user.user_id, 5);
        assert_eq!(user.name, "Lin");
    }

    #[tokio::test]
    async fn test_post_serializes_body() {
        let sender = FixedSender::new(200, r#"{"succeeded":true,"resp_data":true}"#);
        let out: Option<bool> = client(sender.clone())
            .post("/v2/groups/1/topics", &json!({"req_data": {"text": "hi"}}))
            .await
            .unwrap();
        assert_eq!(out, Some(true));

        let seen = sender.seen.lock().unwrap();
        assert_eq!(
            seen[0].body.as_deref(),
            Some(br#"{"req_data":{"text":"hi"}}"#.as_slice())
        );
    }

    #[tokio::test]
    async fn test_business_failure_surfaces_as_api_error() {
        let sender = FixedSender::new(200, r#"{"succeeded":false,"code":10002,"error":"expired"}"#);
        let err = client(sender).delete::<bool>("/v2/topics/1").await.unwrap_err();
        match err {
            SdkError::Api(ApiError::TokenExpired(f)) => assert_eq!(f.message, "expired"),
            other => panic!("expected TokenExpired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_with_retry_writes_retries_server_errors() {
        let sender = FixedSender::new(500, "oops");
        let c = ZsxqClient::builder()
            .token("tok")
            .base_url("http://api.test")
            .retry(2, Duration::from_millis(1))
            .retry_writes(true)
            .sender(sender.clone())
            .sleeper(Arc::new(NoSleep))
            .build()
            .unwrap();

        let err = c.put::<bool, _>("/v2/checkins/1", &json!({})).await.unwrap_err();
        assert_eq!(err.as_api().map(ApiError::kind), Some(ErrorKind::Network));
        assert_eq!(sender.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_build_requires_token() {
        let err = ZsxqClient::builder().build().err().unwrap();
        assert!(matches!(err, SdkError::Config(ConfigError::MissingToken)));
    }

    #[test]
    fn test_builder_from_config_builder() {
        let c = ZsxqClient::builder()
            .config(ClientConfig::builder().token("tok").app_version("9.9.9"))
            .sender(FixedSender::new(200, "{}"))
            .sleeper(Arc::new(NoSleep))
            .build()
            .unwrap();
        assert_eq!(c.config().app_version(), "9.9.9");
    }
}

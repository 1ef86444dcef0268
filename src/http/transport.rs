//! Signed, retrying transport — `Transport`.
//!
//! One call to [`Transport::execute`] is one logical request:
//!
//! 1. Build headers (fresh timestamp, signature if enabled).
//! 2. Send through the [`HttpSender`].
//! 3. Send error: retry if transient and attempts remain, else `Network`.
//! 4. Response: decode the envelope whatever the status. A decoded envelope
//!    ends the call (payload or classified business failure). An undecodable
//!    body is retried when the status is ≥ 500 and is otherwise a `Network`
//!    failure straight away.
//!
//! Attempts run one after another inside the caller's future. The
//! `x-request-id` is generated once per call and reused by every retry, so
//! the server sees retries as the same logical request.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, NETWORK_ERROR_CODE, TIMEOUT_ERROR_CODE};
use crate::http::envelope::{self, Envelope};
use crate::http::request::RequestDescriptor;
use crate::http::retry::{RetryConfig, RetryPolicy, Sleeper};
use crate::http::sender::{HttpSender, RawRequest, RawResponse, SendError};
use crate::http::signing;
use crate::network::{self, CONTENT_TYPE_JSON};

/// Headers derived for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub timestamp: String,
    pub signature: Option<String>,
    pub request_id: String,
    pub version: String,
    pub aduid: String,
    pub user_agent: String,
}

impl SignedHeaders {
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("content-type", CONTENT_TYPE_JSON.to_string()),
            ("user-agent", self.user_agent),
            ("authorization", self.authorization),
            ("x-timestamp", self.timestamp),
        ];
        if let Some(signature) = self.signature {
            pairs.push(("x-signature", signature));
        }
        pairs.push(("x-request-id", self.request_id));
        pairs.push(("x-version", self.version));
        pairs.push(("x-aduid", self.aduid));
        pairs
    }
}

/// Signed HTTP transport with envelope decoding and retries.
#[derive(Clone)]
pub struct Transport {
    config: Arc<ClientConfig>,
    sender: Arc<dyn HttpSender>,
    sleeper: Arc<dyn Sleeper>,
}

impl Transport {
    pub fn new(
        config: Arc<ClientConfig>,
        sender: Arc<dyn HttpSender>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            config,
            sender,
            sleeper,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the headers for one attempt.
    pub fn signed_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
        request_id: &str,
        timestamp: i64,
    ) -> SignedHeaders {
        let timestamp = timestamp.to_string();
        let signature = self.config.signing_enabled().then(|| {
            signing::sign(&timestamp, method, path, body, self.config.signing_key())
        });

        SignedHeaders {
            authorization: self.config.token().to_string(),
            timestamp,
            signature,
            request_id: request_id.to_string(),
            version: self.config.app_version().to_string(),
            aduid: self.config.device_id().to_string(),
            user_agent: network::user_agent(self.config.app_version()),
        }
    }

    /// Run one logical request and decode its payload into `T`.
    ///
    /// `Ok(None)` means the call succeeded without a `resp_data`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Option<T>, ApiError> {
        let retry = request
            .retry
            .clone()
            .unwrap_or_else(|| RetryPolicy::default_for(request.method, &self.config))
            .resolve(&self.config);

        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.config.base_url(), request.path_and_query());
        let body = request.wire_body();

        let mut attempt: u32 = 0;
        loop {
            let headers = self.signed_headers(
                request.method.as_str(),
                &request.path,
                body.as_deref(),
                &request_id,
                Utc::now().timestamp(),
            );
            let raw = RawRequest {
                method: request.method,
                url: url.clone(),
                headers: headers.into_pairs(),
                body: body.clone(),
            };

            tracing::debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt + 1,
                request_id = %request_id,
                "Sending request"
            );

            let failure = match self.sender.send(raw).await {
                Ok(response) => match self.handle_response(response, &request_id) {
                    Attempt::Done(result) => return result,
                    Attempt::Retryable(e) => e,
                },
                Err(e) if e.is_transient() => send_failure(e, &request_id),
                Err(e) => return Err(send_failure(e, &request_id)),
            };

            if attempt >= retry.max_retries {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    attempts = attempt + 1,
                    request_id = %request_id,
                    error = %failure,
                    "Giving up after retries"
                );
                return Err(failure);
            }

            self.backoff(&retry, attempt, &request.path).await;
            attempt += 1;
        }
    }

    fn handle_response<T: DeserializeOwned>(
        &self,
        response: RawResponse,
        request_id: &str,
    ) -> Attempt<T> {
        match envelope::parse(&response.body) {
            Ok(env) => {
                if let Envelope::Failed { code, message } = &env {
                    tracing::warn!(
                        code,
                        message = %message,
                        status = response.status,
                        request_id = %request_id,
                        "API returned business failure"
                    );
                }
                Attempt::Done(env.into_result(Some(request_id)))
            }
            Err(e) => {
                let reason = response.reason.as_deref().unwrap_or("");
                let failure = ApiError::network(
                    NETWORK_ERROR_CODE,
                    format!("HTTP {} {}: {}", response.status, reason, e),
                    Some(request_id.to_string()),
                    Some(response.status),
                    Some(Box::new(e)),
                );
                if response.is_server_error() {
                    Attempt::Retryable(failure)
                } else {
                    Attempt::Done(Err(failure))
                }
            }
        }
    }

    async fn backoff(&self, retry: &RetryConfig, attempt: u32, path: &str) {
        let delay = retry.delay_for_attempt(attempt);
        tracing::debug!(
            attempt = attempt + 1,
            max = retry.max_retries,
            delay_ms = delay.as_millis() as u64,
            "Retrying request to {}",
            path
        );
        self.sleeper.sleep(delay).await;
    }
}

enum Attempt<T> {
    Done(Result<Option<T>, ApiError>),
    Retryable(ApiError),
}

fn send_failure(e: SendError, request_id: &str) -> ApiError {
    let code = if e.is_timeout() {
        TIMEOUT_ERROR_CODE
    } else {
        NETWORK_ERROR_CODE
    };
    ApiError::network(
        code,
        e.to_string(),
        Some(request_id.to_string()),
        None,
        Some(Box::new(e)),
    )
}

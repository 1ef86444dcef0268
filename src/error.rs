//! Unified SDK error types.
//!
//! [`ApiError`] is the closed set of failures a call can end in. Business
//! failures come out of [`classify`]; transport problems are always
//! [`ApiError::Network`]. [`SdkError`] wraps it together with the errors that
//! can happen before a request is ever sent.

use std::fmt;

use thiserror::Error;

/// Boxed error used as the underlying cause of network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Code carried by network failures that are not timeouts.
pub const NETWORK_ERROR_CODE: i64 = 70001;

/// Code carried by network failures caused by a timeout.
pub const TIMEOUT_ERROR_CODE: i64 = 70002;

/// Message used when a failed envelope has neither `error` nor `info`.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl SdkError {
    /// The typed API failure, if this error came from a request.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            SdkError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// Context shared by every API failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: i64,
    pub message: String,
    pub request_id: Option<String>,
}

impl Failure {
    pub fn new(code: i64, message: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.request_id {
            Some(id) => write!(f, "[{}] {} (request_id: {})", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Failure category, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TokenInvalid,
    TokenExpired,
    AuthFailure,
    PermissionDenied,
    NotFound,
    RateLimited,
    Generic,
    Network,
}

/// A typed API failure.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Token rejected by the server (10001).
    #[error("Token invalid: {0}")]
    TokenInvalid(Failure),

    /// Token past its lifetime (10002).
    #[error("Token expired: {0}")]
    TokenExpired(Failure),

    /// Any other authentication failure, e.g. a rejected signature (10003).
    #[error("Auth failure: {0}")]
    AuthFailure(Failure),

    /// Caller lacks permission, is not a member, or is not the owner (2000x).
    #[error("Permission denied: {0}")]
    PermissionDenied(Failure),

    /// Group or topic does not exist (3000x).
    #[error("Not found: {0}")]
    NotFound(Failure),

    /// Too many requests (40001). Not retried by the SDK.
    #[error("Rate limited: {0}")]
    RateLimited(Failure),

    /// Any business error without a dedicated category.
    #[error("API failure: {0}")]
    Generic(Failure),

    /// The exchange could not be completed, or the response was not an envelope.
    #[error("Network failure: {failure}")]
    Network {
        failure: Failure,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },
}

impl ApiError {
    /// Network failure caused by a send error or an undecodable response.
    pub fn network(
        code: i64,
        message: impl Into<String>,
        request_id: Option<String>,
        status: Option<u16>,
        source: Option<BoxError>,
    ) -> Self {
        ApiError::Network {
            failure: Failure::new(code, message, request_id),
            status,
            source,
        }
    }

    pub fn failure(&self) -> &Failure {
        match self {
            ApiError::TokenInvalid(f)
            | ApiError::TokenExpired(f)
            | ApiError::AuthFailure(f)
            | ApiError::PermissionDenied(f)
            | ApiError::NotFound(f)
            | ApiError::RateLimited(f)
            | ApiError::Generic(f) => f,
            ApiError::Network { failure, .. } => failure,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::TokenInvalid(_) => ErrorKind::TokenInvalid,
            ApiError::TokenExpired(_) => ErrorKind::TokenExpired,
            ApiError::AuthFailure(_) => ErrorKind::AuthFailure,
            ApiError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::RateLimited(_) => ErrorKind::RateLimited,
            ApiError::Generic(_) => ErrorKind::Generic,
            ApiError::Network { .. } => ErrorKind::Network,
        }
    }

    pub fn code(&self) -> i64 {
        self.failure().code
    }

    pub fn message(&self) -> &str {
        &self.failure().message
    }

    pub fn request_id(&self) -> Option<&str> {
        self.failure().request_id.as_deref()
    }

    /// Whether this is one of the authentication failures.
    pub fn is_auth(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TokenInvalid | ErrorKind::TokenExpired | ErrorKind::AuthFailure
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network { failure, .. } if failure.code == TIMEOUT_ERROR_CODE)
    }
}

/// Map a business error code from a `succeeded: false` envelope to a typed failure.
///
/// Existing cases are fixed; new codes are added as new arms.
pub fn classify(code: i64, message: &str, request_id: Option<&str>) -> ApiError {
    let failure = |default: &str| {
        let message = if message.is_empty() { default } else { message };
        Failure::new(code, message, request_id.map(str::to_string))
    };

    match code {
        10001 => ApiError::TokenInvalid(failure("token invalid")),
        10002 => ApiError::TokenExpired(failure("token expired")),
        10003 => ApiError::AuthFailure(failure("signature verification failed")),
        20001 => ApiError::PermissionDenied(failure("permission denied")),
        20002 => ApiError::PermissionDenied(failure("not a member of the group")),
        20003 => ApiError::PermissionDenied(failure("not the owner of the group")),
        30001 => ApiError::NotFound(failure("group not found")),
        30002 => ApiError::NotFound(failure("topic not found")),
        40001 => ApiError::RateLimited(failure("too many requests")),
        52010 => ApiError::Generic(failure("not joined the checkin")),
        _ => ApiError::Generic(failure(UNKNOWN_ERROR_MESSAGE)),
    }
}

/// Configuration errors raised while building a client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("token is required")]
    MissingToken,

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{field} is not a valid header value")]
    InvalidHeaderValue { field: &'static str },

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: String, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

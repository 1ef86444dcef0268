//! # ZSXQ SDK
//!
//! Rust client for the ZSXQ HTTP/JSON API.
//!
//! ## Architecture
//!
//! 1. **Config** — `ClientConfig`, immutable and shared by every call
//! 2. **Signing** — HMAC-SHA1 `x-signature` over timestamp, method, path and body
//! 3. **Envelope** — `{ succeeded, code, error|info, resp_data }` decoding
//! 4. **Errors** — wire codes mapped to the closed `ApiError` sum type
//! 5. **Transport** — sign → send → decode → retry with exponential backoff
//! 6. **Client** — `ZsxqClient`, the surface resource modules build on
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zsxq_sdk::prelude::*;
//!
//! let client = ZsxqClient::builder()
//!     .token(std::env::var("ZSXQ_TOKEN")?)
//!     .build()?;
//!
//! let groups: Option<GroupsResponse> = client.get("/v2/groups").await?;
//!
//! let topics: Option<TopicsResponse> = client
//!     .execute(
//!         RequestDescriptor::get("/v2/groups/123/topics")
//!             .query("count", 20)
//!             .query_opt("end_time", end_time),
//!     )
//!     .await?;
//! ```

/// Client configuration.
pub mod config;

/// Unified SDK error types.
pub mod error;

/// Network and header constants.
pub mod network;

/// Signing, envelope decoding, retries and the transport.
pub mod http;

/// `ZsxqClient` — the primary entry point.
pub mod client;

pub mod prelude {
    pub use crate::client::{ZsxqClient, ZsxqClientBuilder};
    pub use crate::config::{ClientConfig, ClientConfigBuilder};
    pub use crate::error::{classify, ApiError, ConfigError, ErrorKind, Failure, SdkError};
    pub use crate::http::signing::sign;
    pub use crate::http::{Method, RequestDescriptor, RetryConfig, RetryPolicy};
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_SIGNING_KEY};
}

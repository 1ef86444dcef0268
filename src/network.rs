//! Network and header constants for the ZSXQ SDK.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.zsxq.com";

/// App version reported in `x-version` and the user agent.
pub const DEFAULT_APP_VERSION: &str = "2.83.0";

/// Signing key used when none is configured.
///
/// This is the key the public app ships with. Deployments that issue their own
/// key should set it through `ClientConfigBuilder::signing_key`.
pub const DEFAULT_SIGNING_KEY: &str = "zsxq-sdk-secret";

/// Product token at the front of the `user-agent` header.
pub const USER_AGENT_PRODUCT: &str = "xiaomiquan";

/// SDK version reported in the `user-agent` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Content type sent on every request.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Build the `user-agent` header value for a given app version.
pub fn user_agent(app_version: &str) -> String {
    format!("{}/{} SDK/{}", USER_AGENT_PRODUCT, app_version, SDK_VERSION)
}

//! HTTP layer — signing, envelope decoding, retries and the transport.

pub mod envelope;
pub mod request;
pub mod retry;
pub mod sender;
pub mod signing;
pub mod transport;

pub use request::{Method, RequestDescriptor};
pub use retry::{RetryConfig, RetryPolicy, Sleeper};
pub use sender::{HttpSender, RawRequest, RawResponse, SendError};
pub use transport::{SignedHeaders, Transport};

#[cfg(feature = "http")]
pub use retry::TimerSleeper;
#[cfg(feature = "http")]
pub use sender::ReqwestSender;

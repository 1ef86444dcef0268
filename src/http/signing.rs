//! Request signing — HMAC-SHA1 over timestamp, method, path and body.
//!
//! The signing string is newline-joined:
//!
//! ```text
//! <timestamp>\n<METHOD>\n<path>[\n<body>]
//! ```
//!
//! The body line is present only for a non-empty body. The MAC is encoded as
//! 40 lowercase hex characters.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Compute the `x-signature` value for one request.
///
/// `timestamp` is Unix seconds as sent in `x-timestamp`; `path` excludes the
/// query string. `body` is signed byte for byte as it goes on the wire.
pub fn sign(
    timestamp: &str,
    method: &str,
    path: &str,
    body: Option<&[u8]>,
    key: &str,
) -> String {
    mac_hex(key, &signing_string(timestamp, method, path, body))
}

pub(crate) fn signing_string(
    timestamp: &str,
    method: &str,
    path: &str,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut data = format!("{}\n{}\n{}", timestamp, method.to_uppercase(), path).into_bytes();
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        data.push(b'\n');
        data.extend_from_slice(body);
    }
    data
}

fn mac_hex(key: &str, data: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take any size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

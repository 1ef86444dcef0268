//! Logical request descriptors handed to the transport.

use std::fmt;

use serde::Serialize;

use crate::http::retry::RetryPolicy;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// POST and PUT carry a JSON body; an absent body is sent as `{}`.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    /// GET and DELETE can be resent without changing the outcome.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logical API call: method, path, query and optional body.
///
/// Built per call and consumed by `Transport::execute`.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path under the base URL, e.g. `/v2/groups`. Signed as-is.
    pub path: String,
    /// Ordered query pairs, already stringified.
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Overrides the method's default retry policy.
    pub retry: Option<RetryPolicy>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retry: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query pair only when `value` is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// The bytes actually sent, which are also the bytes signed.
    pub(crate) fn wire_body(&self) -> Option<Vec<u8>> {
        match (&self.body, self.method.has_body()) {
            (Some(body), _) if !body.is_empty() => Some(body.clone()),
            (_, true) => Some(b"{}".to_vec()),
            (_, false) => None,
        }
    }

    /// Path plus the percent-encoded query string.
    pub(crate) fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_order_and_encoding() {
        let req = RequestDescriptor::get("/v2/groups/1/topics")
            .query("scope", "all")
            .query("count", 20)
            .query("end_time", "2024-01-01T00:00:00.000+0800");
        assert_eq!(
            req.path_and_query(),
            "/v2/groups/1/topics?scope=all&count=20&end_time=2024-01-01T00%3A00%3A00.000%2B0800"
        );
    }

    #[test]
    fn test_query_opt_omits_none() {
        let req = RequestDescriptor::get("/v2/groups")
            .query_opt("limit", Some(5))
            .query_opt::<u32>("offset", None);
        assert_eq!(req.query, vec![("limit".to_string(), "5".to_string())]);
        assert_eq!(req.path_and_query(), "/v2/groups?limit=5");
    }

    #[test]
    fn test_no_query_keeps_path() {
        assert_eq!(RequestDescriptor::get("/v2/users/self").path_and_query(), "/v2/users/self");
    }

    #[test]
    fn test_wire_body_for_writes_defaults_to_empty_object() {
        assert_eq!(RequestDescriptor::post("/v2/x").wire_body(), Some(b"{}".to_vec()));
        assert_eq!(
            RequestDescriptor::put("/v2/x").raw_body(Vec::new()).wire_body(),
            Some(b"{}".to_vec())
        );
        assert_eq!(RequestDescriptor::get("/v2/x").wire_body(), None);
    }

    #[test]
    fn test_json_body() {
        let req = RequestDescriptor::post("/v2/topics")
            .json(&json!({"req_data": {"text": "hi"}}))
            .unwrap();
        assert_eq!(req.wire_body(), Some(br#"{"req_data":{"text":"hi"}}"#.to_vec()));
    }

    #[test]
    fn test_method_properties() {
        assert!(Method::Get.is_idempotent());
        assert!(Method::Delete.is_idempotent());
        assert!(!Method::Post.is_idempotent());
        assert!(Method::Put.has_body());
        assert!(!Method::Delete.has_body());
        assert_eq!(Method::Put.to_string(), "PUT");
    }
}

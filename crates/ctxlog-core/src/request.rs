//! The request type handlers receive

use bytes::Bytes;
use http::{request::Parts, HeaderMap, Method};

/// An HTTP request with its collected body
///
/// The head's `Extensions` hold the [`RequestContext`](crate::RequestContext)
/// while the request is being handled.
pub struct Request {
    pub(crate) parts: Parts,
    body: Bytes,
}

impl Request {
    /// Create a request from its head and body
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self { parts, body }
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Request path, without the query string
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("path", &self.path())
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_request_keeps_head_and_body() {
        let req = http::Request::builder()
            .method(Method::PUT)
            .uri("/files/7?force=true")
            .header("uber-trace-id", "abc123")
            .body(Bytes::from_static(b"payload"))
            .unwrap();

        let req = Request::from(req);

        assert_eq!(req.method(), &Method::PUT);
        assert_eq!(req.path(), "/files/7");
        assert_eq!(req.headers().get("uber-trace-id").unwrap(), "abc123");
        assert_eq!(req.body(), &Bytes::from_static(b"payload"));
        assert_eq!(
            format!("{:?}", req),
            "Request { method: PUT, path: \"/files/7\", body_len: 7 }"
        );
    }
}

//! Response type used by the middleware chain

use bytes::Bytes;
use http_body_util::Full;

/// HTTP response with a fully buffered body
pub type Response = http::Response<Full<Bytes>>;

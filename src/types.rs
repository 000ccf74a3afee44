//! Exchange types observed by the interceptor.
//!
//! This module contains the request and response representations that flow
//! through [`TrafficLogService`](crate::TrafficLogService). Bodies are finite,
//! fully materialized byte sequences: inspecting one for logging clones the
//! underlying [`Bytes`] handle and never disturbs what the rest of the
//! pipeline reads.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, Version};

/// An outgoing HTTP request as seen by the interceptor.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Full request URL
    pub url: Uri,
    /// Negotiated protocol, when the chain already knows it at this point
    pub version: Option<Version>,
    /// Request headers in their original order
    pub headers: HeaderMap,
    /// Request payload, if any
    pub body: Option<RequestBody>,
}

impl Request {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Uri) -> Self {
        Self {
            method,
            url,
            version: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Record the negotiated protocol version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Append a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            self.headers.append(name, value);
        }
        self
    }

    /// Attach a payload.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// A finite, replayable request payload.
///
/// The declared content type and length describe what the producer will put
/// on the wire; the length may be unknown for streaming producers. Cloning
/// the inner [`Bytes`] is cheap and leaves the original untouched.
#[derive(Debug, Clone)]
pub struct RequestBody {
    data: Bytes,
    content_type: Option<String>,
    content_length: Option<u64>,
}

impl RequestBody {
    /// Build a body from in-memory bytes. The declared length is the byte
    /// count of the data.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_length = Some(data.len() as u64);
        Self {
            data,
            content_type: None,
            content_length,
        }
    }

    /// Set the declared content type, e.g. `application/json; charset=utf-8`.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Override the declared length. `None` models a producer whose size is
    /// not known up front.
    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    /// The payload bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Declared length in bytes, `None` when unknown.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

/// An incoming HTTP response as seen by the interceptor.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: StatusCode,
    /// Status message as sent by the server; may be empty
    pub message: String,
    /// URL of the originating request
    pub url: Uri,
    /// Response headers in their original order
    pub headers: HeaderMap,
    /// Response payload, if one was materialized
    pub body: Option<ResponseBody>,
}

impl Response {
    /// Create a response with the status code's canonical reason phrase as
    /// its message and no headers or body.
    pub fn new(status: StatusCode, url: Uri) -> Self {
        let message = status.canonical_reason().unwrap_or_default().to_string();
        Self {
            status,
            message,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Replace the status message (servers may send none at all).
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Append a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            self.headers.append(name, value);
        }
        self
    }

    /// Attach a payload.
    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether the status line and headers promise a body, independent of
    /// whether one was materialized.
    ///
    /// Informational (1xx), 204 and 304 responses never carry a body unless
    /// an explicit Content-Length or a chunked Transfer-Encoding contradicts
    /// the status.
    pub fn promises_body(&self) -> bool {
        let code = self.status.as_u16();
        if !(100..200).contains(&code) && code != 204 && code != 304 {
            return true;
        }
        header_content_length(&self.headers).is_some() || is_chunked(&self.headers)
    }
}

/// A fully materialized response payload.
///
/// The data holds whatever arrived on the wire (still compressed when the
/// response was gzip-encoded); the declared length comes from the response
/// metadata and may be unknown for chunked transfers.
#[derive(Debug, Clone)]
pub struct ResponseBody {
    data: Bytes,
    content_type: Option<String>,
    content_length: Option<u64>,
}

impl ResponseBody {
    /// Build a body from in-memory bytes. The declared length is the byte
    /// count of the data.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_length = Some(data.len() as u64);
        Self {
            data,
            content_type: None,
            content_length,
        }
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Override the declared length. `None` when the transfer did not
    /// announce one.
    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    /// The payload bytes as received.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Declared length in bytes, `None` when unknown.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

fn header_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get(header::TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
}

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::http::headers::Headers;

/// Value sent in the `Server` header.
pub const SERVER_NAME: &str = concat!("rootserve/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes the server produces.
///
/// - `Ok` (200): File served
/// - `BadRequest` (400): Malformed request or undecodable target
/// - `Forbidden` (403): Target escapes the document root
/// - `NotFound` (404): No regular file at the target
/// - `MethodNotAllowed` (405): Anything other than GET or HEAD
/// - `RequestTimeout` (408): Client too slow to send its request
/// - `PayloadTooLarge` (413): Declared body over the limit
/// - `UriTooLong` (414): Request line over the limit
/// - `RequestHeaderFieldsTooLarge` (431): Header block over the limit
/// - `InternalServerError` (500): Filesystem failure after validation
/// - `NotImplemented` (501): Transfer-Encoding in the request
/// - `HttpVersionNotSupported` (505): Major version other than 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 408 Request Timeout
    RequestTimeout,
    /// 413 Payload Too Large
    PayloadTooLarge,
    /// 414 URI Too Long
    UriTooLong,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use rootserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestTimeout => 408,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::UriTooLong => 414,
            StatusCode::RequestHeaderFieldsTooLarge => 431,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use rootserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UriTooLong => "URI Too Long",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Where the response payload comes from.
pub enum Body {
    Empty,
    Bytes(Bytes),
    /// An open file streamed to the client. `len` is the size reported by
    /// `stat` and is what goes into Content-Length.
    File {
        reader: Pin<Box<dyn AsyncRead + Send>>,
        len: u64,
    },
    /// Nothing is written, but Content-Length still reports `len`. Used to
    /// answer HEAD with the headers GET would have produced.
    Omitted(u64),
}

impl Body {
    /// Number of bytes announced in Content-Length.
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } | Body::Omitted(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the in-memory payload, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Bytes(bytes) => Some(bytes.as_ref()),
            Body::Empty => Some(&[]),
            _ => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Body::File { len, .. } => f.debug_struct("File").field("len", len).finish_non_exhaustive(),
            Body::Omitted(len) => f.debug_tuple("Omitted").field(len).finish(),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(v))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Bytes(b)
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Content-Length is not stored in `headers`; the writer derives it from
/// `body` so the two cannot disagree.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Header fields, written in insertion order after Content-Length and
    /// Content-Type
    pub headers: Headers,
    /// Response payload
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .body(b"<p>hi</p>".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Body,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Adds or replaces a header.
    ///
    /// Content-Length is ignored here since it always comes from the body.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !key.eq_ignore_ascii_case("Content-Length") {
            self.headers.set(key, value);
        }
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// Adds `Server` and `Connection: close` unless already present.
    pub fn build(mut self) -> Response {
        if !self.headers.contains("Server") {
            self.headers.append("Server", SERVER_NAME);
        }
        if !self.headers.contains("Connection") {
            self.headers.append("Connection", "close");
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .body(body)
            .build()
    }

    /// Creates an error response with a short HTML body such as
    /// `<h1>404 Not Found</h1>`.
    pub fn error_page(status: StatusCode) -> Self {
        let html = format!("<h1>{}</h1>", status);
        ResponseBuilder::new(status)
            .header("Content-Type", "text/html")
            .body(html.into_bytes())
            .build()
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::error_page(StatusCode::NotFound)
    }

    /// Creates a 403 Forbidden response.
    pub fn forbidden() -> Self {
        Self::error_page(StatusCode::Forbidden)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        Self::error_page(StatusCode::BadRequest)
    }

    /// Creates a 405 response advertising the methods that are served.
    pub fn method_not_allowed() -> Self {
        let mut response = Self::error_page(StatusCode::MethodNotAllowed);
        response.headers.append("Allow", "GET, HEAD");
        response
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::error_page(StatusCode::InternalServerError)
    }

    /// Value written in the Content-Length header.
    pub fn content_length(&self) -> u64 {
        self.body.len()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    /// Turns this into the answer to a HEAD request: same status and
    /// headers, no payload. Any open file is closed here.
    pub fn into_head(self) -> Self {
        let len = self.body.len();
        Response {
            status: self.status,
            headers: self.headers,
            body: Body::Omitted(len),
        }
    }
}

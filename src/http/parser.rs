use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use crate::http::headers::Headers;
use crate::http::request::{is_token, Method, Request, Version};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("invalid method token")]
    InvalidMethod,
    #[error("invalid request target")]
    InvalidTarget,
    #[error("invalid protocol version")]
    InvalidVersion,
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(Version),
    #[error("invalid header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("request line too long")]
    RequestLineTooLong,
    #[error("header block too large")]
    HeadersTooLarge,
    #[error("too many header fields")]
    TooManyHeaders,
    #[error("request body too large")]
    BodyTooLarge,
    #[error("Transfer-Encoding is not supported")]
    UnsupportedTransferEncoding,
    #[error("incomplete request")]
    Incomplete,
}

/// Size bounds applied while a request is buffered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Longest accepted request line, excluding CRLF.
    pub max_request_line_len: usize,
    /// Largest accepted head (request line + headers + blank line).
    pub max_headers_size: usize,
    pub max_header_count: usize,
    pub max_body_size: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_request_line_len: 8 * 1024,
            max_headers_size: 64 * 1024,
            max_header_count: 100,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Parses one request from the front of `buf`.
///
/// Returns the request together with the number of bytes it occupied, or
/// [`ParseError::Incomplete`] if more input is needed. Limits are checked on
/// partial input too, so an oversized head fails as soon as it crosses the
/// bound instead of growing the buffer further.
pub fn parse_http_request(
    buf: &[u8],
    limits: &ParseLimits,
) -> Result<(Request, usize), ParseError> {
    let line_end = match find_crlf(buf) {
        Some(line_end) if line_end > limits.max_request_line_len => {
            return Err(ParseError::RequestLineTooLong);
        }
        None if buf.len() > limits.max_request_line_len => {
            return Err(ParseError::RequestLineTooLong);
        }
        None => return Err(ParseError::Incomplete),
        Some(line_end) => line_end,
    };

    // A bad request line is reported without waiting for the headers.
    let (method, target, version) = parse_request_line(&buf[..line_end])?;

    let headers_end = match find_headers_end(buf) {
        Some(end) if end + 4 > limits.max_headers_size => {
            return Err(ParseError::HeadersTooLarge);
        }
        Some(end) => end,
        None if buf.len() >= limits.max_headers_size => {
            return Err(ParseError::HeadersTooLarge);
        }
        None => return Err(ParseError::Incomplete),
    };

    let head = std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidHeader)?;
    let lines = head.split("\r\n").skip(1);

    // Headers
    let mut headers = Headers::new();

    for line in lines {
        if headers.len() == limits.max_header_count {
            return Err(ParseError::TooManyHeaders);
        }

        // obs-fold continuation lines are not accepted
        if line.starts_with([' ', '\t']) {
            return Err(ParseError::InvalidHeader);
        }

        let (name, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        if !is_token(name) || value.bytes().any(|b| b.is_ascii_control() && b != b'\t') {
            return Err(ParseError::InvalidHeader);
        }

        headers.append(name, value.trim_matches([' ', '\t']));
    }

    if headers.contains("Transfer-Encoding") {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    // Body
    let content_length = content_length(&headers)?.unwrap_or(0);
    if content_length > limits.max_body_size {
        return Err(ParseError::BodyTooLarge);
    }

    let body_start = headers_end + 4;
    if buf.len() - body_start < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = (content_length > 0)
        .then(|| Bytes::copy_from_slice(&buf[body_start..body_start + content_length]));

    let request = Request {
        method,
        target,
        version,
        headers,
        body,
    };

    Ok((request, body_start + content_length))
}

/// Splits and validates `METHOD SP target SP HTTP/x.y`.
pub fn parse_request_line(line: &[u8]) -> Result<(Method, String, Version), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidRequest)?;
    if line.bytes().any(|b| b.is_ascii_control()) {
        return Err(ParseError::InvalidRequest);
    }

    let parts: Vec<&str> = line.split_ascii_whitespace().collect();
    let [method_str, target, version_str] = parts[..] else {
        return Err(ParseError::InvalidRequest);
    };

    let method = Method::parse(method_str).ok_or(ParseError::InvalidMethod)?;
    let version = Version::parse(version_str).ok_or(ParseError::InvalidVersion)?;
    if version.major != 1 {
        return Err(ParseError::UnsupportedVersion(version));
    }

    let target_ok = match target {
        // asterisk-form only exists for OPTIONS
        "*" => method == Method::OPTIONS,
        t => t.starts_with('/') || t.contains("://"),
    };
    if !target_ok {
        return Err(ParseError::InvalidTarget);
    }

    Ok((method, target.to_string(), version))
}

/// Reads the declared body length. Repeated fields must agree.
fn content_length(headers: &Headers) -> Result<Option<usize>, ParseError> {
    let mut length = None;

    for value in headers.get_all("Content-Length") {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidContentLength);
        }
        let parsed: usize = value
            .parse()
            .map_err(|_| ParseError::InvalidContentLength)?;

        match length {
            Some(prev) if prev != parsed => return Err(ParseError::InvalidContentLength),
            _ => length = Some(parsed),
        }
    }

    Ok(length)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}

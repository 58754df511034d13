//! Request-level failures and the status codes they map to.

use std::io;

use thiserror::Error;

use crate::files::resolver::ResolveError;
use crate::http::parser::ParseError;
use crate::http::request::Method;
use crate::http::response::{Response, StatusCode};

/// Why a request did not get a 200.
///
/// Every variant still produces a complete HTTP response; transport
/// failures are not represented here because nothing can be sent for them.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("malformed request: {0}")]
    Parse(#[from] ParseError),
    #[error("bad request target: {0}")]
    BadTarget(ResolveError),
    #[error("request target escapes the document root")]
    Traversal,
    #[error("no file at the requested path")]
    NotFound,
    #[error("method {0} is not supported")]
    UnsupportedMethod(Method),
    #[error("request not received in time")]
    Timeout,
    #[error("filesystem failure: {0}")]
    Internal(#[source] io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Parse(e) => match e {
                ParseError::RequestLineTooLong => StatusCode::UriTooLong,
                ParseError::HeadersTooLarge | ParseError::TooManyHeaders => {
                    StatusCode::RequestHeaderFieldsTooLarge
                }
                ParseError::BodyTooLarge => StatusCode::PayloadTooLarge,
                ParseError::UnsupportedTransferEncoding => StatusCode::NotImplemented,
                ParseError::UnsupportedVersion(_) => StatusCode::HttpVersionNotSupported,
                _ => StatusCode::BadRequest,
            },
            ServeError::BadTarget(_) => StatusCode::BadRequest,
            ServeError::Traversal => StatusCode::Forbidden,
            ServeError::NotFound => StatusCode::NotFound,
            ServeError::UnsupportedMethod(_) => StatusCode::MethodNotAllowed,
            ServeError::Timeout => StatusCode::RequestTimeout,
            ServeError::Internal(_) => StatusCode::InternalServerError,
        }
    }
}

impl From<ResolveError> for ServeError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Traversal => ServeError::Traversal,
            ResolveError::Io(io) => ServeError::Internal(io),
            other => ServeError::BadTarget(other),
        }
    }
}

impl Response {
    /// The error page sent for `err`.
    pub fn from_error(err: &ServeError) -> Self {
        match err {
            ServeError::UnsupportedMethod(_) => Response::method_not_allowed(),
            other => Response::error_page(other.status()),
        }
    }
}

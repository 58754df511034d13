//! Static file serving
//!
//! Path resolution against the document root and the request handler that
//! turns requests into file responses.

pub mod handler;
pub mod resolver;
pub mod root;

//! rootserve - Static File Server
//!
//! Serves files below a document root over HTTP/1.1, one request per
//! connection and one task per connection.

pub mod config;
pub mod error;
pub mod files;
pub mod fs;
pub mod http;
pub mod server;

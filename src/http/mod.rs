//! HTTP/1.1 protocol implementation.
//!
//! Each connection carries exactly one request and is closed after the
//! response (`Connection: close`).
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine
//! - **`parser`**: Parses incoming requests from byte buffers, with size limits
//! - **`headers`**: Ordered, case-insensitive header multimap
//! - **`request`**: Request, method and version types
//! - **`response`**: Status codes, bodies and the response builder
//! - **`writer`**: Serializes and writes responses to the client
//! - **`mime`**: Content-Type lookup by file extension
//! - **`date`**: IMF-fixdate formatting for the `Date` header
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Buffer bytes until a full request parses
//!        └──────┬──────┘
//!               │ Request received        │ Parse error / timeout
//!               ▼                         │
//!        ┌──────────────────┐             │
//!        │   Processing     │ ← Handler   │
//!        └──────┬───────────┘             │
//!               │ Response ready          │ Error page
//!               ▼                         ▼
//!        ┌──────────────────────────────────┐
//!        │             Writing              │
//!        └──────┬───────────────────────────┘
//!               ▼
//!        ┌─────────────┐
//!        │   Closed    │
//!        └─────────────┘
//! ```

pub mod connection;
pub mod date;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

//! # hosttop-http
//!
//! Extracts the requested virtual host from raw bytes captured off a
//! worker's socket.
//!
//! Captured buffers are opaque: they may be partial, may be a response
//! body or a TLS record, or may not be HTTP at all. Everything here is
//! allocation-light and never panics on malformed input; failures are
//! classified through [`ParseError`] so callers can drop the sample.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod host;
pub mod request;

pub use error::ParseError;
pub use host::{HostSource, RawRequest, extract_host};
pub use request::is_request_line;

//! Classified failures of host extraction.

use thiserror::Error;

/// Why a captured buffer did not yield a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The first line is not an HTTP/1.x request line.
    #[error("buffer does not start with an HTTP request line")]
    NotARequest,
    /// The request carries no `Host:` header.
    #[error("request has no Host header")]
    NoHostHeader,
}

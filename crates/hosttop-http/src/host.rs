//! `Host:` header extraction.

use crate::error::ParseError;
use crate::request::{CrlfLines, is_request_line};

/// Case-sensitive prefix of the header naming the virtual host.
const HOST_MARKER: &[u8] = b"Host:";

/// Something that can name the virtual host a request was sent to.
///
/// Raw intercepted bytes go through [`RawRequest`]. A front end that
/// already holds a parsed request can implement this directly and feed
/// the same counter store.
pub trait HostSource {
    /// Returns the requested host, verbatim.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the data is not a request or names
    /// no host.
    fn host(&self) -> Result<String, ParseError>;
}

/// Bytes copied out of an intercepted receive call.
#[derive(Debug, Clone, Copy)]
pub struct RawRequest<'a> {
    bytes: &'a [u8],
}

impl<'a> RawRequest<'a> {
    /// Wraps a captured buffer.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl HostSource for RawRequest<'_> {
    fn host(&self) -> Result<String, ParseError> {
        extract_host(self.bytes)
    }
}

/// Extracts the `Host:` header value from a raw HTTP/1.x request.
///
/// Header lines are trimmed before matching, so a folded `" Host: x"`
/// still counts. The value is everything after the first colon, trimmed;
/// a port suffix such as `example.com:8080` is kept. Scanning stops at the
/// blank line that ends the header block. Invalid UTF-8 is replaced
/// lossily.
///
/// # Errors
///
/// [`ParseError::NotARequest`] if the first line is not a request line,
/// [`ParseError::NoHostHeader`] if no non-empty `Host:` header precedes
/// the end of the headers.
pub fn extract_host(buf: &[u8]) -> Result<String, ParseError> {
    let mut lines = CrlfLines::new(buf);
    if !lines.next().is_some_and(is_request_line) {
        return Err(ParseError::NotARequest);
    }

    lines
        .take_while(|line| !line.is_empty())
        .map(<[u8]>::trim_ascii)
        .find(|line| line.starts_with(HOST_MARKER))
        .map(header_value)
        .filter(|host| !host.is_empty())
        .ok_or(ParseError::NoHostHeader)
}

fn header_value(line: &[u8]) -> String {
    let value = line
        .iter()
        .position(|&b| b == b':')
        .map_or(&[][..], |colon| &line[colon + 1..]);
    String::from_utf8_lossy(value.trim_ascii()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_extracted_and_trimmed() {
        let good = b"GET /some/shit HTTP/1.1\r\n Host: localhost  \r\nSome other string";
        assert_eq!(extract_host(good), Ok("localhost".to_owned()));
    }

    #[test]
    fn missing_host_header_is_classified() {
        let bad = b"GET /some/shit HTTP/1.1\r\n Accept: application/json  \r\nSome other string";
        assert_eq!(extract_host(bad), Err(ParseError::NoHostHeader));
    }

    #[test]
    fn non_request_wins_over_host_header() {
        let buf = b"Accept: application/json\r\nHost: example.com\r\n\r\n";
        assert_eq!(extract_host(buf), Err(ParseError::NotARequest));
        assert_eq!(extract_host(b"Somestring"), Err(ParseError::NotARequest));
        assert_eq!(extract_host(b""), Err(ParseError::NotARequest));
    }

    #[test]
    fn port_suffix_is_preserved() {
        let buf = b"GET / HTTP/1.1\r\nHost: example.com:8080\r\n\r\n";
        assert_eq!(extract_host(buf), Ok("example.com:8080".to_owned()));
    }

    #[test]
    fn case_is_preserved() {
        let buf = b"GET / HTTP/1.1\r\nHost: WWW.Example.COM\r\n\r\n";
        assert_eq!(extract_host(buf), Ok("WWW.Example.COM".to_owned()));
    }

    #[test]
    fn lowercase_header_name_does_not_match() {
        let buf = b"GET / HTTP/1.1\r\nhost: example.com\r\n\r\n";
        assert_eq!(extract_host(buf), Err(ParseError::NoHostHeader));
    }

    #[test]
    fn first_host_header_wins() {
        let buf = b"GET / HTTP/1.1\r\nHost: a.test\r\nHost: b.test\r\n\r\n";
        assert_eq!(extract_host(buf), Ok("a.test".to_owned()));
    }

    #[test]
    fn body_is_not_inspected() {
        let buf = b"POST /form HTTP/1.1\r\nContent-Length: 17\r\n\r\nHost: body.test\r\n";
        assert_eq!(extract_host(buf), Err(ParseError::NoHostHeader));
    }

    #[test]
    fn empty_host_value_is_rejected() {
        let buf = b"GET / HTTP/1.1\r\nHost:   \r\n\r\n";
        assert_eq!(extract_host(buf), Err(ParseError::NoHostHeader));
    }

    #[test]
    fn truncated_request_still_yields_host() {
        let buf = b"GET /index.html HTTP/1.1\r\nUser-Agent: curl/8.0\r\nHost: partial.test";
        assert_eq!(extract_host(buf), Ok("partial.test".to_owned()));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let buf = b"GET / HTTP/1.1\r\nHost: caf\xff.test\r\n\r\n";
        assert_eq!(extract_host(buf), Ok("caf\u{fffd}.test".to_owned()));
    }

    #[test]
    fn raw_request_adapter_delegates() {
        let source = RawRequest::new(b"HEAD /health HTTP/1.1\r\nHost: api.test\r\n\r\n");
        assert_eq!(source.host(), Ok("api.test".to_owned()));
    }
}

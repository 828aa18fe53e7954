//! Request-line classification.
//!
//! A captured buffer is treated as an HTTP request only when its first
//! CRLF-delimited line splits on single spaces into at least three tokens
//! and the third one starts with `HTTP`.

/// Prefix of the protocol token in an HTTP/1.x request line.
const PROTOCOL_MARKER: &[u8] = b"HTTP";

/// Iterator over CRLF-delimited lines of a byte buffer.
///
/// Always yields at least one (possibly empty) line. A lone `\n` is not a
/// line break.
#[derive(Debug, Clone)]
pub struct CrlfLines<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> CrlfLines<'a> {
    /// Starts splitting `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { rest: Some(buf) }
    }
}

impl<'a> Iterator for CrlfLines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        if let Some(at) = rest.windows(2).position(|w| w == b"\r\n") {
            self.rest = Some(&rest[at + 2..]);
            Some(&rest[..at])
        } else {
            self.rest = None;
            Some(rest)
        }
    }
}

/// Returns whether `line` looks like an HTTP/1.x request line.
///
/// The line is trimmed, then split on single spaces; consecutive spaces
/// produce empty tokens, so `"GET  / HTTP/1.1"` is rejected.
#[must_use]
pub fn is_request_line(line: &[u8]) -> bool {
    line.trim_ascii()
        .split(|&b| b == b' ')
        .nth(2)
        .is_some_and(|protocol| protocol.starts_with(PROTOCOL_MARKER))
}

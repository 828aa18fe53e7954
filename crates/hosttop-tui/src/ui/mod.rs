//! Widgets and text helpers shared by the renderers.

pub mod table;

use std::borrow::Cow;

/// Makes an attacker-controlled host name safe to print on a terminal.
///
/// Control characters (escape sequences included) are replaced with
/// U+FFFD so a crafted `Host:` header cannot drive the terminal.
#[must_use]
pub fn printable_host(host: &str) -> Cow<'_, str> {
    if host.chars().any(char::is_control) {
        Cow::Owned(
            host.chars()
                .map(|c| if c.is_control() { '\u{fffd}' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_host_is_borrowed() {
        assert!(matches!(printable_host("example.com"), Cow::Borrowed("example.com")));
    }

    #[test]
    fn escape_sequences_are_neutralized() {
        let shown = printable_host("evil\x1b[2J.test\r\n");
        assert_eq!(shown, "evil\u{fffd}[2J.test\u{fffd}\u{fffd}");
    }
}

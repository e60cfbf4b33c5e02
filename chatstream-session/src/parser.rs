//! Event parser: one decoded line in, at most one protocol event out.
//!
//! Only `data: ` lines matter. Blank lines, `:` comments (OpenRouter sends
//! `: OPENROUTER PROCESSING` keep-alives), and any other field are ignored.

/// Prefix of a line that carries a payload.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A protocol event recognized on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseEvent<'a> {
    /// A payload to hand to the delta extractor, prefix stripped.
    Data(&'a str),
    /// The `[DONE]` sentinel.
    Done,
}

/// Parse one line. Returns `None` for lines that carry no event.
///
/// A trailing `\r` is tolerated. The sentinel match is case-sensitive after
/// trimming surrounding whitespace.
#[must_use]
pub fn parse_line(line: &str) -> Option<SseEvent<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload.trim() == DONE_SENTINEL {
        Some(SseEvent::Done)
    } else {
        Some(SseEvent::Data(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_line_yields_payload() {
        assert_eq!(
            parse_line(r#"data: {"choices":[]}"#),
            Some(SseEvent::Data(r#"{"choices":[]}"#))
        );
    }

    #[test]
    fn done_sentinel_ends_stream() {
        assert_eq!(parse_line("data: [DONE]"), Some(SseEvent::Done));
        assert_eq!(parse_line("data:   [DONE]  "), Some(SseEvent::Done));
        assert_eq!(parse_line("data: [DONE]\r"), Some(SseEvent::Done));
    }

    #[test]
    fn sentinel_is_case_sensitive() {
        assert_eq!(parse_line("data: [done]"), Some(SseEvent::Data("[done]")));
    }

    #[test]
    fn other_lines_are_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("\r"), None);
        assert_eq!(parse_line(": OPENROUTER PROCESSING"), None);
        assert_eq!(parse_line("event: message"), None);
        assert_eq!(parse_line("id: 42"), None);
        assert_eq!(parse_line("DATA: [DONE]"), None);
        assert_eq!(parse_line("data:[DONE]"), None);
        assert_eq!(parse_line(" data: [DONE]"), None);
    }

    #[test]
    fn crlf_is_stripped_from_payload() {
        assert_eq!(parse_line("data: {}\r"), Some(SseEvent::Data("{}")));
    }

    #[test]
    fn empty_payload_is_still_data() {
        assert_eq!(parse_line("data: "), Some(SseEvent::Data("")));
    }
}

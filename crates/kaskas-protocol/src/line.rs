//! Classification of a single device line by its header.

use crate::{Dialect, Header};

/// What kind of traffic a line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Structured reply traffic (`@`).
    Api,
    /// Free-form log output (`#`).
    Log,
    /// Debug trace output (`!`).
    Debug,
    /// No known header. Usually the continuation of a multi-line reply.
    Unrecognized,
}

impl From<Header> for LineKind {
    fn from(header: Header) -> Self {
        match header {
            Header::Api => Self::Api,
            Header::Log => Self::Log,
            Header::Debug => Self::Debug,
        }
    }
}

/// One decoded line, borrowed from the text it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    kind: LineKind,
    raw: &'a str,
    payload: &'a str,
}

impl<'a> Line<'a> {
    /// Classifies `raw` by its first character.
    ///
    /// For tagged lines the payload is everything after the tag; for
    /// unrecognized lines it is the whole line.
    pub fn parse(raw: &'a str) -> Self {
        let header = raw.chars().next().and_then(Header::from_tag);
        match header {
            Some(header) => Self {
                kind: header.into(),
                raw,
                payload: &raw[header.tag().len_utf8()..],
            },
            None => Self {
                kind: LineKind::Unrecognized,
                raw,
                payload: raw,
            },
        }
    }

    /// The kind of traffic.
    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// The first character of the line as received, if any.
    pub fn header(&self) -> Option<char> {
        self.raw.chars().next()
    }

    /// The line with its header stripped.
    pub fn payload(&self) -> &'a str {
        self.payload
    }

    /// Whether the line closes a structured reply.
    pub fn is_terminated(&self) -> bool {
        self.payload.ends_with(Dialect::RESPONSE_FOOTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_lines_strip_header() {
        let log = Line::parse("#pump started");
        assert_eq!(log.kind(), LineKind::Log);
        assert_eq!(log.payload(), "pump started");
        assert_eq!(log.header(), Some('#'));

        let debug = Line::parse("!adc=812");
        assert_eq!(debug.kind(), LineKind::Debug);
        assert_eq!(debug.payload(), "adc=812");

        let api = Line::parse("@FLU<OK:DONE>");
        assert_eq!(api.kind(), LineKind::Api);
        assert_eq!(api.payload(), "FLU<OK:DONE>");
        assert!(api.is_terminated());
    }

    #[test]
    fn test_parse_unrecognized_keeps_whole_line() {
        let line = Line::parse("bar>");
        assert_eq!(line.kind(), LineKind::Unrecognized);
        assert_eq!(line.payload(), "bar>");
        assert_eq!(line.header(), Some('b'));
        assert!(line.is_terminated());
    }

    #[test]
    fn test_parse_empty_line() {
        let line = Line::parse("");
        assert_eq!(line.kind(), LineKind::Unrecognized);
        assert_eq!(line.header(), None);
        assert!(!line.is_terminated());
    }

    #[test]
    fn test_header_only_line_has_empty_payload() {
        let line = Line::parse("@");
        assert_eq!(line.kind(), LineKind::Api);
        assert_eq!(line.payload(), "");
    }
}

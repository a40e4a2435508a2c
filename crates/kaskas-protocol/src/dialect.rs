//! Lexical constants of the KasKas line protocol.
//!
//! Every line the controller prints starts with a one-character header
//! that says what kind of traffic it is:
//!
//! ```text
//! #pump started            free-form log line
//! !adc raw=812             debug trace
//! @MTC<OK:21.5|55.2|>      structured reply to a request
//! ```
//!
//! Requests from the host carry no header:
//!
//! ```text
//! FLU:waterNow:100         module FLU, function waterNow, one argument
//! ?                        ask the controller to print its usage
//! ```

/// The protocol's tags and operators.
#[derive(Debug, Clone, Copy)]
pub struct Dialect;

impl Dialect {
    /// Header of structured request/reply traffic.
    pub const HEADER_API: char = '@';
    /// Header of free-form log lines.
    pub const HEADER_LOG: char = '#';
    /// Header of debug trace lines.
    pub const HEADER_DEBUG: char = '!';

    /// Separates module from function (and function from arguments) in a request.
    pub const REQUEST: char = ':';
    /// Separates module from status in a reply.
    pub const RESPONSE: char = '<';
    /// The whole of a print-usage request.
    pub const REQUEST_PRINT_USAGE: char = '?';
    /// Terminates the last line of a structured reply.
    pub const RESPONSE_FOOTER: char = '>';

    /// Separates the status token from the values in a reply.
    pub const STATUS_SEPARATOR: char = ':';
    /// Separates arguments in requests and values in replies.
    pub const ARGUMENT_SEPARATOR: char = '|';
    /// Terminates every line on the wire.
    pub const LINE_TERMINATOR: char = '\n';
}

/// The kinds of header a device line can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
    Api,
    Log,
    Debug,
}

impl Header {
    /// Looks up the header for a tag character.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            Dialect::HEADER_API => Some(Self::Api),
            Dialect::HEADER_LOG => Some(Self::Log),
            Dialect::HEADER_DEBUG => Some(Self::Debug),
            _ => None,
        }
    }

    /// The tag character of this header.
    pub fn tag(self) -> char {
        match self {
            Self::Api => Dialect::HEADER_API,
            Self::Log => Dialect::HEADER_LOG,
            Self::Debug => Dialect::HEADER_DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_tags_round_trip() {
        for header in [Header::Api, Header::Log, Header::Debug] {
            assert_eq!(Header::from_tag(header.tag()), Some(header));
        }
    }

    #[test]
    fn test_unknown_tag_has_no_header() {
        assert_eq!(Header::from_tag('F'), None);
        assert_eq!(Header::from_tag(Dialect::RESPONSE_FOOTER), None);
    }
}

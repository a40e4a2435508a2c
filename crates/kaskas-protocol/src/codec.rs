//! Decoding of complete replies into [`Response`]s.
//!
//! A reply, once assembled, looks like:
//!
//! ```text
//! MTC<OK:21.5|55.2|19.8|
//! └┬┘│└┬┘│└──────┬──────┘
//!  │ │ │ │       └ value tail, `|`-separated
//!  │ │ │ └ status separator
//!  │ │ └ status token
//!  │ └ response operator
//!  └ module the request was addressed to
//! ```
//!
//! The footer has already been stripped by the assembler.

use crate::{Dialect, ProtocolError, Request, Response, Status};

/// Decodes `reply` as the answer to `request`.
///
/// A print-usage reply keeps its whole value tail as one argument. Any
/// other reply splits the tail on `|`, dropping one trailing empty field
/// left by a trailing separator. A reply without a value tail has no
/// arguments.
///
/// # Errors
/// - [`ProtocolError::MismatchedReply`] if the reply is not addressed from
///   the request's module.
/// - [`ProtocolError::UnknownStatus`] if the status token is not a known
///   status name.
///
/// ```rust
/// use kaskas_protocol::{decode_reply, Request, Status};
///
/// let request = Request::call("MTC", "getMetrics", Vec::<String>::new()).unwrap();
/// let response = decode_reply(&request, "MTC<OK:21.5|55.2|19.8|").unwrap();
/// assert_eq!(response.status(), Status::Ok);
/// assert_eq!(response.arguments(), ["21.5", "55.2", "19.8"]);
/// ```
pub fn decode_reply(request: &Request, reply: &str) -> Result<Response, ProtocolError> {
    let expected = request.reply_prefix();
    let Some(rest) = reply.strip_prefix(expected.as_str()) else {
        return Err(ProtocolError::MismatchedReply {
            expected,
            reply: reply.to_string(),
        });
    };

    let (token, tail) = match rest.split_once(Dialect::STATUS_SEPARATOR) {
        Some((token, tail)) => (token, Some(tail)),
        None => (rest, None),
    };
    let status: Status = token.parse()?;

    let arguments = match (request, tail) {
        (_, None) => Vec::new(),
        (Request::PrintUsage, Some(tail)) => vec![tail.to_string()],
        (Request::Call { .. }, Some(tail)) => split_values(tail),
    };
    Ok(Response::new(status, arguments))
}

fn split_values(tail: &str) -> Vec<String> {
    let mut values: Vec<String> = tail
        .split(Dialect::ARGUMENT_SEPARATOR)
        .map(str::to_string)
        .collect();
    if values.last().is_some_and(String::is_empty) {
        values.pop();
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(module: &str, function: &str) -> Request {
        Request::call(module, function, Vec::<String>::new()).unwrap()
    }

    #[test]
    fn test_single_value() {
        let response = decode_reply(&call("FLU", "waterNow"), "FLU<OK:DONE").unwrap();
        assert_eq!(response, Response::new(Status::Ok, vec!["DONE".into()]));
    }

    #[test]
    fn test_trailing_separator_is_dropped() {
        let response =
            decode_reply(&call("MTC", "getMetrics"), "MTC<OK:21.5|55.2|19.8|").unwrap();
        assert_eq!(response.arguments(), ["21.5", "55.2", "19.8"]);
    }

    #[test]
    fn test_inner_empty_fields_are_kept() {
        let response = decode_reply(&call("MTC", "getMetrics"), "MTC<OK:1||3").unwrap();
        assert_eq!(response.arguments(), ["1", "", "3"]);
    }

    #[test]
    fn test_empty_tail_has_no_arguments() {
        let response = decode_reply(&call("CLK", "sync"), "CLK<OK:").unwrap();
        assert!(response.arguments().is_empty());
        let response = decode_reply(&call("CLK", "sync"), "CLK<BAD_RESULT").unwrap();
        assert_eq!(response.status(), Status::BadResult);
        assert!(response.arguments().is_empty());
    }

    #[test]
    fn test_multiline_tail_stays_one_value() {
        let response = decode_reply(&call("DAQ", "dump"), "DAQ<OK:foo\nbar").unwrap();
        assert_eq!(response.arguments(), ["foo\nbar"]);
    }

    #[test]
    fn test_only_first_colon_splits_status() {
        let response = decode_reply(&call("CLK", "now"), "CLK<OK:12:30:00").unwrap();
        assert_eq!(response.arguments(), ["12:30:00"]);
    }

    #[test]
    fn test_print_usage_tail_is_one_argument() {
        let usage = "FLU:waterNow:ml|MTC:getMetrics|";
        let response =
            decode_reply(&Request::print_usage(), &format!("?<OK:{usage}")).unwrap();
        assert_eq!(response.arguments(), [usage]);
    }

    #[test]
    fn test_device_side_statuses() {
        let response = decode_reply(&call("FLU", "waterNow"), "FLU<BAD_INPUT:ml").unwrap();
        assert_eq!(response.status(), Status::BadInput);
        assert!(response.is_success_like());
    }

    #[test]
    fn test_reply_from_other_module_is_mismatched() {
        let err = decode_reply(&call("FLU", "waterNow"), "MTC<OK:1").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MismatchedReply {
                expected: "FLU<".into(),
                reply: "MTC<OK:1".into(),
            }
        );
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let err = decode_reply(&call("FLU", "waterNow"), "FLU<42:DONE").unwrap_err();
        assert_eq!(err, ProtocolError::UnknownStatus("42".into()));
    }
}

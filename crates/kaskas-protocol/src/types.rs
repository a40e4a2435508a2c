//! Request and response types exchanged with the controller.
//!
//! A [`Request`] names a module on the device (a functional area such as
//! `FLU` for fluids or `MTC` for metrics), a function within it, and
//! optional string arguments. The device answers with a [`Response`]: a
//! [`Status`] and the values it returned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Dialect, ProtocolError};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome of a request.
///
/// The first three statuses come from the device itself. The rest are
/// produced on the host when no usable device-level answer was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The device carried out the request.
    Ok,
    /// The device rejected the request's arguments.
    BadInput,
    /// The device ran the request but it failed.
    BadResult,
    /// A reply arrived but it did not answer the request.
    BadResponse,
    /// No device is connected.
    CommunicationError,
    /// No reply arrived in time.
    Timeout,
    /// Anything else.
    UnknownError,
}

impl Status {
    /// Every status, in wire order.
    pub const ALL: [Status; 7] = [
        Self::Ok,
        Self::BadInput,
        Self::BadResult,
        Self::BadResponse,
        Self::CommunicationError,
        Self::Timeout,
        Self::UnknownError,
    ];

    /// The status name as it appears on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadInput => "BAD_INPUT",
            Self::BadResult => "BAD_RESULT",
            Self::BadResponse => "BAD_RESPONSE",
            Self::CommunicationError => "COMMUNICATION_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Returns `true` if the device answered the request, even if it
    /// rejected it.
    pub fn is_success_like(self) -> bool {
        matches!(self, Self::Ok | Self::BadInput | Self::BadResult)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.name() == token)
            .ok_or_else(|| ProtocolError::UnknownStatus(token.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A decoded answer to a request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    status: Status,
    arguments: Vec<String>,
}

impl Response {
    /// Creates a response with values.
    pub fn new(status: Status, arguments: Vec<String>) -> Self {
        Self { status, arguments }
    }

    /// Creates a response without values.
    pub fn from_status(status: Status) -> Self {
        Self::new(status, Vec::new())
    }

    /// The status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The returned values, in order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Consumes the response and returns its values.
    pub fn into_arguments(self) -> Vec<String> {
        self.arguments
    }

    /// See [`Status::is_success_like`].
    pub fn is_success_like(&self) -> bool {
        self.status.is_success_like()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.status, self.arguments.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request for the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Call `function` of `module` with `args`.
    Call {
        module: String,
        function: String,
        args: Vec<String>,
    },
    /// Ask the controller to describe its modules and functions.
    PrintUsage,
}

/// Module name under which print-usage replies come back.
const PRINT_USAGE_MODULE: &str = "?";

/// Characters that would split a module or function name on the wire.
const NAME_RESERVED: [char; 6] = [
    Dialect::REQUEST,
    Dialect::RESPONSE,
    Dialect::RESPONSE_FOOTER,
    Dialect::ARGUMENT_SEPARATOR,
    '\r',
    Dialect::LINE_TERMINATOR,
];

/// Characters that would split an argument on the wire.
const ARGUMENT_RESERVED: [char; 3] = [Dialect::ARGUMENT_SEPARATOR, '\r', Dialect::LINE_TERMINATOR];

impl Request {
    /// Builds a call request, rejecting parts that would break framing.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRequest`] if the module or function
    /// is empty or contains an operator, or if an argument contains the
    /// argument separator or a line break.
    pub fn call<I, S>(
        module: impl Into<String>,
        function: impl Into<String>,
        args: I,
    ) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let module = module.into();
        let function = function.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        validate_name("module", &module)?;
        if module == PRINT_USAGE_MODULE {
            return Err(ProtocolError::InvalidRequest(
                "module \"?\" is reserved for print-usage requests".into(),
            ));
        }
        validate_name("function", &function)?;
        if let Some(arg) = args.iter().find(|a| a.contains(ARGUMENT_RESERVED)) {
            return Err(ProtocolError::InvalidRequest(format!(
                "argument {arg:?} contains a reserved character"
            )));
        }

        Ok(Self::Call {
            module,
            function,
            args,
        })
    }

    /// The print-usage request.
    pub fn print_usage() -> Self {
        Self::PrintUsage
    }

    /// The module the reply will be addressed from.
    pub fn module(&self) -> &str {
        match self {
            Self::Call { module, .. } => module,
            Self::PrintUsage => PRINT_USAGE_MODULE,
        }
    }

    /// The prefix a matching reply starts with: `MODULE<`.
    pub fn reply_prefix(&self) -> String {
        format!("{}{}", self.module(), Dialect::RESPONSE)
    }

    /// Encodes the request as one wire line, terminator included.
    ///
    /// ```rust
    /// use kaskas_protocol::Request;
    ///
    /// let request = Request::call("FLU", "waterNow", ["100"]).unwrap();
    /// assert_eq!(request.encode(), b"FLU:waterNow:100\n");
    /// assert_eq!(Request::print_usage().encode(), b"?\n");
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut line = String::new();
        match self {
            Self::Call {
                module,
                function,
                args,
            } => {
                line.push_str(module);
                line.push(Dialect::REQUEST);
                line.push_str(function);
                for (i, arg) in args.iter().enumerate() {
                    line.push(if i == 0 {
                        Dialect::REQUEST
                    } else {
                        Dialect::ARGUMENT_SEPARATOR
                    });
                    line.push_str(arg);
                }
            }
            Self::PrintUsage => line.push(Dialect::REQUEST_PRINT_USAGE),
        }
        line.push(Dialect::LINE_TERMINATOR);
        line.into_bytes()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.encode();
        let text = String::from_utf8_lossy(&line);
        f.write_str(text.trim_end())
    }
}

/// Parses the textual form `MODULE:FUNCTION[:ARG1|ARG2|...]`, or `?`.
///
/// This is what the device parses off the wire, and what an interactive
/// prompt accepts from a user.
impl FromStr for Request {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end_matches(['\r', Dialect::LINE_TERMINATOR]);
        if s.len() == 1 && s.starts_with(Dialect::REQUEST_PRINT_USAGE) {
            return Ok(Self::PrintUsage);
        }

        let mut parts = s.splitn(3, Dialect::REQUEST);
        let module = parts.next().unwrap_or_default();
        let function = parts.next().ok_or_else(|| {
            ProtocolError::InvalidRequest(format!(
                "expected MODULE{0}FUNCTION[{0}ARG|ARG], got {s:?}",
                Dialect::REQUEST
            ))
        })?;
        let args: Vec<&str> = match parts.next() {
            Some(args) => args.split(Dialect::ARGUMENT_SEPARATOR).collect(),
            None => Vec::new(),
        };
        Self::call(module, function, args)
    }
}

fn validate_name(what: &str, name: &str) -> Result<(), ProtocolError> {
    if name.is_empty() {
        return Err(ProtocolError::InvalidRequest(format!("{what} is empty")));
    }
    if name.contains(NAME_RESERVED) {
        return Err(ProtocolError::InvalidRequest(format!(
            "{what} {name:?} contains a reserved character"
        )));
    }
    Ok(())
}

//! Error types for the protocol layer.
//!
//! Each KasKas crate defines its own error enum. A `ProtocolError` means
//! the text on the wire did not have the expected shape; it never means
//! the serial link itself failed.

/// Errors that can occur in the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The status token of a reply is not one the protocol defines.
    ///
    /// The host and the device disagree on the wire contract. Callers
    /// should treat this as a defect, not as a device-side failure.
    #[error("unknown status token {0:?}")]
    UnknownStatus(String),

    /// A reply arrived but it does not answer the request that was sent.
    #[error("reply {reply:?} does not start with {expected:?}")]
    MismatchedReply {
        /// Prefix the reply should have started with (`MODULE<`).
        expected: String,
        /// The complete reply as received.
        reply: String,
    },

    /// A request cannot be encoded because one of its parts would break
    /// the line framing.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

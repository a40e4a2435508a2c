//! Wire protocol for KasKas.
//!
//! This crate defines the "language" the host and the grow-bed controller
//! speak over the serial line:
//!
//! - **Dialect** ([`Dialect`], [`Header`]): the single-character tags and
//!   operators of the line protocol.
//! - **Routing** ([`Line`], [`LineRouter`], [`ReplyAssembler`]): how each
//!   incoming line is classified, and how multi-line structured replies are
//!   stitched back together.
//! - **Codec** ([`Request`], [`Response`], [`Status`], [`decode_reply`]):
//!   how requests become bytes and replies become typed responses.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (text lines) and the
//! datalink (queues and the pump task). It does no I/O and keeps no clock;
//! everything here is a pure function or a small state machine.
//!
//! ```text
//! Transport (lines) → Protocol (Routed / Response) → Datalink (queues)
//! ```

mod assembler;
mod codec;
mod dialect;
mod error;
mod line;
mod router;
mod types;

pub use assembler::{Assembled, ReplyAssembler};
pub use codec::decode_reply;
pub use dialect::{Dialect, Header};
pub use error::ProtocolError;
pub use line::{Line, LineKind};
pub use router::{LineRouter, Routed};
pub use types::{Request, Response, Status};

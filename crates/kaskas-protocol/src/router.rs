//! The line router: one decoded line in, one destination out.
//!
//! Every line the device prints ends up in exactly one place. Log and
//! debug lines go to their sinks straight away; reply lines (and untagged
//! lines while a reply is open) go through the [`ReplyAssembler`].

use crate::{Assembled, Line, LineKind, ReplyAssembler};

/// Where a line was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// A log line, header stripped.
    Log(String),
    /// A debug line, header stripped.
    Debug(String),
    /// A complete structured reply, ready for the inbound queue.
    Reply(String),
    /// Part of a reply that is still being assembled.
    Pending,
    /// The reply in progress overflowed the fragment limit and was dropped.
    Overflow {
        /// Fragments thrown away.
        discarded: usize,
    },
    /// A line without a known header and no reply to attach it to.
    Unrecognized(String),
}

/// Classifies lines and assembles replies.
#[derive(Debug, Default)]
pub struct LineRouter {
    assembler: ReplyAssembler,
}

impl LineRouter {
    /// Creates a router with the default reply fragment limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router whose assembler holds at most `max_fragments`
    /// fragments of one reply.
    pub fn with_max_fragments(max_fragments: usize) -> Self {
        Self {
            assembler: ReplyAssembler::with_max_fragments(max_fragments),
        }
    }

    /// Routes one trimmed, non-empty line.
    ///
    /// An untagged line that arrives while a reply is open is taken as the
    /// reply's continuation: replies may carry text whose first character
    /// happens not to be a header.
    pub fn route(&mut self, raw: &str) -> Routed {
        let line = Line::parse(raw);
        match line.kind() {
            LineKind::Log => Routed::Log(line.payload().to_string()),
            LineKind::Debug => Routed::Debug(line.payload().to_string()),
            LineKind::Api => self.assemble(line.payload()),
            LineKind::Unrecognized if self.assembler.is_pending() => {
                self.assemble(line.payload())
            }
            LineKind::Unrecognized => Routed::Unrecognized(raw.to_string()),
        }
    }

    /// Whether a reply is currently being assembled.
    ///
    /// While this is `true` the datalink holds back outgoing requests.
    pub fn is_pending(&self) -> bool {
        self.assembler.is_pending()
    }

    /// Drops any half-assembled reply, e.g. after the device went away.
    pub fn reset(&mut self) -> usize {
        self.assembler.reset()
    }

    fn assemble(&mut self, payload: &str) -> Routed {
        match self.assembler.feed(payload) {
            Assembled::Complete(reply) => Routed::Reply(reply),
            Assembled::Pending { .. } => Routed::Pending,
            Assembled::Overflow { discarded } => Routed::Overflow { discarded },
        }
    }
}

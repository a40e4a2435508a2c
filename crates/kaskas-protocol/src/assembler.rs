//! Reassembly of structured replies that span several lines.
//!
//! The controller may print a reply over more than one line. Only the last
//! line carries the footer (`>`):
//!
//! ```text
//! @DAQ<OK:foo       opens a pending reply
//! bar>              closes it → "DAQ<OK:foo\nbar"
//! ```
//!
//! The assembler is an explicit two-state machine:
//!
//! ```text
//!            unterminated                 terminated
//!   Idle ──────────────────→ Pending ───────────────────→ Idle (+ reply)
//!    │                        │  ↺ unterminated
//!    └── terminated ──→ Idle (+ reply)
//! ```

use std::mem;

use crate::Dialect;

/// Internal state. There is never more than one reply in progress.
#[derive(Debug, Default)]
enum AssemblyState {
    #[default]
    Idle,
    Pending(Vec<String>),
}

/// Outcome of feeding one payload into the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    /// A reply is complete: fragments joined with `\n`, footer stripped.
    Complete(String),
    /// The payload was buffered; the reply continues on a later line.
    Pending {
        /// Fragments buffered so far.
        fragments: usize,
    },
    /// The pending reply grew past the fragment limit and was dropped.
    Overflow {
        /// Fragments thrown away, including the one just fed.
        discarded: usize,
    },
}

/// Accumulates reply fragments until a footer-terminated one arrives.
#[derive(Debug)]
pub struct ReplyAssembler {
    state: AssemblyState,
    max_fragments: usize,
}

impl ReplyAssembler {
    /// Default bound on buffered fragments of one reply.
    pub const DEFAULT_MAX_FRAGMENTS: usize = 64;

    /// Creates an idle assembler with the default fragment limit.
    pub fn new() -> Self {
        Self::with_max_fragments(Self::DEFAULT_MAX_FRAGMENTS)
    }

    /// Creates an idle assembler holding at most `max_fragments`
    /// unterminated fragments (at least one).
    ///
    /// A lost footer would otherwise merge every following reply into one
    /// ever-growing pending reply.
    pub fn with_max_fragments(max_fragments: usize) -> Self {
        Self {
            state: AssemblyState::Idle,
            max_fragments: max_fragments.max(1),
        }
    }

    /// Feeds one payload. `payload` is terminated iff it ends with the footer.
    pub fn feed(&mut self, payload: &str) -> Assembled {
        if let Some(body) = payload.strip_suffix(Dialect::RESPONSE_FOOTER) {
            let body = body.trim();
            return match mem::take(&mut self.state) {
                AssemblyState::Idle => Assembled::Complete(body.to_string()),
                AssemblyState::Pending(mut fragments) => {
                    fragments.push(body.to_string());
                    Assembled::Complete(fragments.join("\n"))
                }
            };
        }

        match &mut self.state {
            AssemblyState::Idle => {
                self.state = AssemblyState::Pending(vec![payload.to_string()]);
                Assembled::Pending { fragments: 1 }
            }
            AssemblyState::Pending(fragments) if fragments.len() >= self.max_fragments => {
                let discarded = fragments.len() + 1;
                self.state = AssemblyState::Idle;
                Assembled::Overflow { discarded }
            }
            AssemblyState::Pending(fragments) => {
                fragments.push(payload.to_string());
                Assembled::Pending {
                    fragments: fragments.len(),
                }
            }
        }
    }

    /// Whether a reply is in progress.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, AssemblyState::Pending(_))
    }

    /// Number of fragments buffered for the reply in progress.
    pub fn fragments(&self) -> usize {
        match &self.state {
            AssemblyState::Idle => 0,
            AssemblyState::Pending(fragments) => fragments.len(),
        }
    }

    /// Drops any reply in progress and returns how many fragments it held.
    pub fn reset(&mut self) -> usize {
        match mem::take(&mut self.state) {
            AssemblyState::Idle => 0,
            AssemblyState::Pending(fragments) => fragments.len(),
        }
    }
}

impl Default for ReplyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminated_payload_completes_immediately() {
        let mut asm = ReplyAssembler::new();
        assert_eq!(
            asm.feed("FLU<OK:DONE>"),
            Assembled::Complete("FLU<OK:DONE".into())
        );
        assert!(!asm.is_pending());
    }

    #[test]
    fn test_continuation_is_joined_with_newline() {
        let mut asm = ReplyAssembler::new();
        assert_eq!(asm.feed("DAQ<OK:foo"), Assembled::Pending { fragments: 1 });
        assert!(asm.is_pending());
        assert_eq!(asm.feed("bar>"), Assembled::Complete("DAQ<OK:foo\nbar".into()));
        assert!(!asm.is_pending());
        assert_eq!(asm.fragments(), 0);
    }

    #[test]
    fn test_footer_body_is_trimmed() {
        let mut asm = ReplyAssembler::new();
        asm.feed("MTC<OK:1|");
        assert_eq!(asm.feed("2| >"), Assembled::Complete("MTC<OK:1|\n2|".into()));
    }

    #[test]
    fn test_one_reply_per_terminated_sequence() {
        let mut asm = ReplyAssembler::new();
        asm.feed("A<OK:1");
        asm.feed("2");
        assert_eq!(asm.feed("3>"), Assembled::Complete("A<OK:1\n2\n3".into()));
        // The next reply starts from scratch.
        assert_eq!(asm.feed("B<OK:x>"), Assembled::Complete("B<OK:x".into()));
    }

    #[test]
    fn test_overflow_discards_pending_reply() {
        let mut asm = ReplyAssembler::with_max_fragments(2);
        asm.feed("A<OK:1");
        asm.feed("2");
        assert_eq!(asm.feed("3"), Assembled::Overflow { discarded: 3 });
        assert!(!asm.is_pending());
        // A terminated line after the overflow stands on its own.
        assert_eq!(asm.feed("B<OK:x>"), Assembled::Complete("B<OK:x".into()));
    }

    #[test]
    fn test_terminated_line_completes_even_at_limit() {
        let mut asm = ReplyAssembler::with_max_fragments(1);
        asm.feed("A<OK:1");
        assert_eq!(asm.feed("2>"), Assembled::Complete("A<OK:1\n2".into()));
    }

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        let mut asm = ReplyAssembler::with_max_fragments(0);
        assert_eq!(asm.feed("A<OK:1"), Assembled::Pending { fragments: 1 });
    }

    #[test]
    fn test_reset_reports_dropped_fragments() {
        let mut asm = ReplyAssembler::new();
        asm.feed("A<OK:1");
        asm.feed("2");
        assert_eq!(asm.reset(), 2);
        assert_eq!(asm.reset(), 0);
    }
}

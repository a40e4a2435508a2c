//! The datalink between KasKas callers and the controller.
//!
//! A single pump task owns the transport. Callers never touch it: they
//! push encoded requests into the [`OutgoingQueue`] and take completed
//! replies from the engine's inbound channel. Everything else the device
//! says (log and debug chatter) is routed to `tracing` and the on-disk log
//! sink by the pump.
//!
//! # Key types
//!
//! - [`Datalink`]: owns the pump task and its lifecycle
//! - [`DatalinkConfig`]: timings, capacities, and the root directory
//! - [`Opener`]: produces a fresh transport when the device (re)appears
//! - [`DeviceLock`]: exclusive claim on a root directory
//! - [`LogSink`]: timestamped, append-only device log

mod config;
mod engine;
mod error;
mod lock;
mod outgoing;
mod pump;
mod sink;

pub use config::DatalinkConfig;
pub use engine::{Datalink, Opener};
pub use error::DatalinkError;
pub use lock::DeviceLock;
pub use outgoing::{outgoing_queue, OutgoingDrain, OutgoingQueue};
pub use sink::LogSink;

/// `tracing` target for lines emitted by the device itself.
pub const DEVICE_TARGET: &str = "kaskas::device";

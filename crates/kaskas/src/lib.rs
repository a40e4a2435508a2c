//! # KasKas
//!
//! Host-side client for the KasKas grow-bed controller.
//!
//! The controller speaks a line protocol over USB serial that carries log
//! lines, debug lines, and request/response exchanges on the same stream.
//! This crate ties the layers together: transport → datalink → protocol.
//! A [`KasKas`] handle owns the link; callers issue requests and get
//! decoded [`Response`]s back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kaskas::prelude::*;
//!
//! # async fn run() -> Result<(), KasKasError> {
//! kaskas::logging::init(None);
//! let kaskas = KasKasBuilder::new().root(".").build_serial()?;
//! kaskas.start().await?;
//!
//! let metrics = kaskas.request("MTC", "getMetrics", Vec::<String>::new()).await?;
//! for value in metrics.arguments() {
//!     println!("{value}");
//! }
//! kaskas.stop(true).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod logging;

pub use client::{KasKas, KasKasBuilder, CANONICAL_NAME, NOT_CONNECTED};
pub use error::KasKasError;

pub use kaskas_datalink::{Datalink, DatalinkConfig, DatalinkError, Opener};
pub use kaskas_protocol::{ProtocolError, Request, Response, Status};
pub use kaskas_transport::{Transport, TransportError};

/// A handle on a controller attached over serial.
#[cfg(feature = "serial")]
pub type SerialKasKas = KasKas<kaskas_transport::SerialTransport>;

/// Common imports for working with KasKas.
pub mod prelude {
    pub use crate::{
        DatalinkConfig, KasKas, KasKasBuilder, KasKasError, Request, Response, Status,
    };
    pub use kaskas_transport::{
        loopback, LoopbackDevice, LoopbackTransport, Transport, TransportError,
    };

    #[cfg(feature = "serial")]
    pub use crate::SerialKasKas;
    #[cfg(feature = "serial")]
    pub use kaskas_transport::SerialTransport;
}

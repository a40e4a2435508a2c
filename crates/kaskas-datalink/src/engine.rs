//! The engine handle: construction, lifecycle, and the caller-facing ends
//! of the queues.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use kaskas_protocol::LineRouter;
use kaskas_transport::Transport;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::pump::{LinkState, Pump};
use crate::{DatalinkConfig, DatalinkError, DeviceLock, LogSink, OutgoingQueue, outgoing_queue};

pub use crate::pump::Opener;

/// Where the pump is in its life.
enum PumpSlot<T: Transport> {
    /// Built but not spawned yet.
    Idle(Box<Pump<T>>),
    Running(JoinHandle<()>),
    Finished,
}

/// A running (or ready to run) datalink to the controller.
///
/// The engine holds the root directory's [`DeviceLock`] for its whole
/// life; dropping it stops the pump and releases the lock.
pub struct Datalink<T: Transport> {
    config: DatalinkConfig,
    state: Arc<LinkState>,
    outgoing: OutgoingQueue,
    inbound: Mutex<mpsc::Receiver<String>>,
    shutdown: watch::Sender<bool>,
    pump: Mutex<PumpSlot<T>>,
    _lock: DeviceLock,
}

impl<T: Transport> Datalink<T> {
    /// Builds an engine around an already open transport.
    ///
    /// If the transport is lost later the engine stays disconnected.
    pub fn with_transport(config: DatalinkConfig, transport: T) -> Result<Self, DatalinkError> {
        let config = config.validated();
        let lock = DeviceLock::acquire(config.lock_path())?;
        Self::build(config, lock, Some(transport), None)
    }

    /// Builds an engine that opens (and later reopens) the device itself.
    ///
    /// One attempt is made right away. If it fails the engine starts
    /// disconnected and the pump keeps trying, unless
    /// [`DatalinkConfig::require_device`] is set, in which case the error
    /// is returned.
    pub fn with_opener<O>(config: DatalinkConfig, mut opener: O) -> Result<Self, DatalinkError>
    where
        O: Opener<T>,
    {
        let config = config.validated();
        let lock = DeviceLock::acquire(config.lock_path())?;
        let transport = match opener.open() {
            Ok(transport) => Some(transport),
            Err(error) if config.require_device => return Err(error.into()),
            Err(error) => {
                warn!(%error, "device not available, starting disconnected");
                None
            }
        };
        Self::build(config, lock, transport, Some(Box::new(opener)))
    }

    fn build(
        config: DatalinkConfig,
        lock: DeviceLock,
        transport: Option<T>,
        opener: Option<Box<dyn Opener<T>>>,
    ) -> Result<Self, DatalinkError> {
        let sink = LogSink::open(config.log_path())?;

        let state = Arc::new(LinkState::default());
        state
            .connected
            .store(transport.is_some(), Ordering::SeqCst);
        let (outgoing, drain) = outgoing_queue(config.outgoing_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let last_open_attempt = opener.as_ref().map(|_| Instant::now());
        let pump = Pump {
            router: LineRouter::with_max_fragments(config.max_reply_fragments),
            config: config.clone(),
            transport,
            opener,
            last_open_attempt,
            outgoing: drain,
            inbound: inbound_tx,
            sink,
            state: Arc::clone(&state),
            shutdown: shutdown_rx,
        };

        info!(root = %config.root.display(), "datalink ready");
        Ok(Self {
            config,
            state,
            outgoing,
            inbound: Mutex::new(inbound_rx),
            shutdown: shutdown_tx,
            pump: Mutex::new(PumpSlot::Idle(Box::new(pump))),
            _lock: lock,
        })
    }

    /// Spawns the pump and waits until it is running.
    ///
    /// Calling it again, or after [`stop`](Self::stop), does nothing.
    pub async fn start(&self) -> Result<(), DatalinkError> {
        let mut slot = self.pump.lock().await;
        let pump = match std::mem::replace(&mut *slot, PumpSlot::Finished) {
            PumpSlot::Idle(pump) => pump,
            other => {
                *slot = other;
                debug!("datalink already started");
                return Ok(());
            }
        };

        let (ready_tx, ready_rx) = oneshot::channel();
        self.state.started.store(true, Ordering::SeqCst);
        *slot = PumpSlot::Running(tokio::spawn(pump.run(ready_tx)));
        drop(slot);

        ready_rx.await.map_err(|_| DatalinkError::Stopped)
    }

    /// Asks the pump to exit; with `blocking`, waits until it has.
    ///
    /// Stopping an engine that was never started discards the pump, so a
    /// later [`start`](Self::start) does nothing.
    pub async fn stop(&self, blocking: bool) -> Result<(), DatalinkError> {
        self.shutdown.send_replace(true);
        {
            let mut slot = self.pump.lock().await;
            if let PumpSlot::Idle(_) = &*slot {
                *slot = PumpSlot::Finished;
                return Ok(());
            }
        }
        info!("datalink stopping");
        if blocking {
            self.wait().await?;
        }
        Ok(())
    }

    /// Waits for the pump to exit.
    ///
    /// # Errors
    /// [`DatalinkError::NotStarted`] if the pump was never spawned.
    pub async fn wait(&self) -> Result<(), DatalinkError> {
        let handle = {
            let mut slot = self.pump.lock().await;
            match std::mem::replace(&mut *slot, PumpSlot::Finished) {
                PumpSlot::Running(handle) => handle,
                PumpSlot::Finished => return Ok(()),
                idle @ PumpSlot::Idle(_) => {
                    *slot = idle;
                    return Err(DatalinkError::NotStarted);
                }
            }
        };
        if let Err(join_error) = handle.await {
            error!(%join_error, "datalink pump panicked");
        }
        Ok(())
    }

    /// Whether [`start`](Self::start) has spawned the pump.
    pub fn is_started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    /// Whether the pump is currently looping.
    pub fn is_up_and_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Whether a device is currently open.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// Queue feeding the pump.
    pub fn outgoing(&self) -> &OutgoingQueue {
        &self.outgoing
    }

    /// Queues an encoded line for the device.
    pub async fn enqueue(&self, line: Vec<u8>) -> Result<(), DatalinkError> {
        self.outgoing.enqueue(line).await
    }

    /// Takes the next completed reply, waiting at most `timeout`.
    ///
    /// Returns `None` on timeout or once the pump has exited.
    pub async fn next_reply(&self, timeout: Duration) -> Option<String> {
        let mut inbound = self.inbound.lock().await;
        match tokio::time::timeout(timeout, inbound.recv()).await {
            Ok(reply) => reply,
            Err(_elapsed) => None,
        }
    }

    /// Drops replies nobody waited for. Returns how many were dropped.
    pub async fn discard_stale_replies(&self) -> usize {
        let mut inbound = self.inbound.lock().await;
        let mut discarded = 0;
        while let Ok(reply) = inbound.try_recv() {
            debug!(%reply, "discarding stale reply");
            discarded += 1;
        }
        discarded
    }

    /// The validated configuration the engine runs with.
    pub fn config(&self) -> &DatalinkConfig {
        &self.config
    }
}

impl<T: Transport> Drop for Datalink<T> {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

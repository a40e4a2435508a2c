//! The outgoing queue: encoded requests waiting for the pump.
//!
//! Any number of callers may hold an [`OutgoingQueue`]; exactly one
//! [`OutgoingDrain`] exists and the pump owns it. Entries leave in the
//! order they were enqueued.

use tokio::sync::mpsc;

use crate::DatalinkError;

/// Creates a queue holding at most `capacity` entries (minimum 1).
pub fn outgoing_queue(capacity: usize) -> (OutgoingQueue, OutgoingDrain) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (OutgoingQueue { tx }, OutgoingDrain { rx })
}

/// Producer side. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OutgoingQueue {
    tx: mpsc::Sender<Vec<u8>>,
}

impl OutgoingQueue {
    /// Appends `line`, waiting while the queue is full.
    ///
    /// Fails with [`DatalinkError::Stopped`] once the drain is gone.
    pub async fn enqueue(&self, line: Vec<u8>) -> Result<(), DatalinkError> {
        self.tx.send(line).await.map_err(|_| DatalinkError::Stopped)
    }

    /// Number of entries waiting to be drained.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether nothing is waiting to be drained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer side, owned by the pump.
#[derive(Debug)]
pub struct OutgoingDrain {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl OutgoingDrain {
    /// Takes everything currently queued, oldest first. Never waits.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line);
        }
        lines
    }
}

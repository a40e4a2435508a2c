//! Exclusive claim on a root directory.
//!
//! Only one engine may talk to the device at a time. The claim is an
//! advisory lock on `<root>/kaskas.lock`, held for as long as the
//! [`DeviceLock`] lives. The file itself is left in place; a stale file
//! without a holder does not block the next process.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::DatalinkError;

/// Holds the lock on a lock file until dropped.
#[derive(Debug)]
pub struct DeviceLock {
    path: PathBuf,
    file: File,
}

impl DeviceLock {
    /// Locks `path`, creating the file if needed. Never waits.
    ///
    /// # Errors
    /// - [`DatalinkError::LockContention`] if the lock is already held,
    ///   by this process or another one.
    /// - [`DatalinkError::Lock`] if the file cannot be opened or locked.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, DatalinkError> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| DatalinkError::Lock {
                path: path.clone(),
                source,
            })?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(DatalinkError::LockContention { path });
            }
            Err(TryLockError::Error(source)) => {
                return Err(DatalinkError::Lock { path, source });
            }
        }

        // Record the holder for whoever finds the file later.
        if let Err(error) = file
            .set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()))
        {
            warn!(file = %path.display(), %error, "could not record pid in lock file");
        }

        info!(file = %path.display(), "device lock acquired");
        Ok(Self { path, file })
    }

    /// The locked file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeviceLock {
    fn drop(&mut self) {
        if let Err(error) = self.file.unlock() {
            warn!(file = %self.path.display(), %error, "failed to release device lock");
        } else {
            debug!(file = %self.path.display(), "device lock released");
        }
    }
}

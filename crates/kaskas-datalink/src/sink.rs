//! Timestamped, append-only log of device output.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::DatalinkError;

/// Appends `<timestamp>: <line>` entries to a file, flushing each one.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: File,
}

impl LogSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatalinkError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| DatalinkError::LogSink {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    /// Writes one entry stamped with the current local time.
    pub fn append(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{}: {line}", timestamp())?;
        self.file.flush()
    }

    /// File the entries go to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Local time as `YYYY-MM-DD HH:MM:SS.ffffff`, or UTC when the local
/// offset cannot be determined.
fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
    now.format(format).unwrap_or_else(|_| now.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checks the `YYYY-MM-DD HH:MM:SS.ffffff` shape.
    fn is_timestamp(stamp: &str) -> bool {
        let bytes = stamp.as_bytes();
        stamp.len() == 26
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                10 => *b == b' ',
                13 | 16 => *b == b':',
                19 => *b == b'.',
                _ => b.is_ascii_digit(),
            })
    }

    #[test]
    fn test_timestamp_shape() {
        let stamp = timestamp();
        assert!(is_timestamp(&stamp), "unexpected timestamp {stamp:?}");
    }

    #[test]
    fn test_entries_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaskas.log");

        let mut sink = LogSink::open(&path).unwrap();
        sink.append("#booting").unwrap();
        sink.append("#ready").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<_> = content.lines().collect();
        assert_eq!(entries.len(), 2);
        for (entry, line) in entries.iter().zip(["#booting", "#ready"]) {
            let (stamp, text) = entry.split_once(": ").unwrap();
            assert!(is_timestamp(stamp), "unexpected timestamp {stamp:?}");
            assert_eq!(text, line);
        }
    }

    #[test]
    fn test_reopen_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaskas.log");

        LogSink::open(&path).unwrap().append("#first").unwrap();
        LogSink::open(&path).unwrap().append("#second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with("#second\n"));
    }
}

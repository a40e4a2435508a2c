//! Reassembly of raw byte chunks into text lines.

/// Accumulates raw bytes and splits them into newline-terminated lines.
///
/// Serial reads return whatever bytes happened to be in the driver's
/// buffer, so a line can arrive in several pieces. Bytes after the last
/// `\n` are kept until a later chunk completes them.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of raw bytes.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Removes and returns every complete line, in arrival order.
    ///
    /// The `\n` terminator and a preceding `\r` are stripped. Invalid UTF-8
    /// is replaced rather than rejected so one corrupted byte does not
    /// cost the whole read.
    pub fn take_lines(&mut self) -> Vec<String> {
        let Some(last) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let mut complete: Vec<u8> = self.pending.drain(..=last).collect();
        // Drop the final terminator so `split` yields no empty tail.
        complete.pop();
        complete
            .split(|&b| b == b'\n')
            .map(|raw| {
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
                String::from_utf8_lossy(raw).into_owned()
            })
            .collect()
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops any partial line.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_lines_returns_nothing_without_terminator() {
        let mut buf = LineBuffer::new();
        buf.extend(b"#booting");
        assert!(buf.take_lines().is_empty());
        assert_eq!(buf.pending_len(), 8);
    }

    #[test]
    fn test_take_lines_splits_and_keeps_remainder() {
        let mut buf = LineBuffer::new();
        buf.extend(b"#one\r\n!two\n@MTC<OK:");
        assert_eq!(buf.take_lines(), vec!["#one", "!two"]);
        assert_eq!(buf.pending_len(), "@MTC<OK:".len());

        buf.extend(b"1|2|>\n");
        assert_eq!(buf.take_lines(), vec!["@MTC<OK:1|2|>"]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn test_take_lines_keeps_empty_lines() {
        // Filtering blank lines is the datalink's job, not the buffer's.
        let mut buf = LineBuffer::new();
        buf.extend(b"\n\n#x\n");
        assert_eq!(buf.take_lines(), vec!["", "", "#x"]);
    }

    #[test]
    fn test_take_lines_replaces_invalid_utf8() {
        let mut buf = LineBuffer::new();
        buf.extend(&[b'#', 0xff, b'k', b'\n']);
        let lines = buf.take_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('#'));
        assert!(lines[0].ends_with('k'));
    }

    #[test]
    fn test_clear_drops_partial_line() {
        let mut buf = LineBuffer::new();
        buf.extend(b"partial");
        buf.clear();
        buf.extend(b"#fresh\n");
        assert_eq!(buf.take_lines(), vec!["#fresh"]);
    }
}

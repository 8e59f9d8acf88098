//! Line-oriented link abstraction
//!
//! The logging loop only needs three things from the device: how many bytes
//! are waiting, the next line, and a way to send a command back.

use std::io;

/// A bidirectional, line-oriented connection to the telemetry source
pub trait TelemetryLink {
    /// Bytes that can be read without blocking. Must not block.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to and excluding the next `\n`.
    ///
    /// May block for at most the link's read timeout. If the timeout expires
    /// first, whatever arrived is returned as the line; `None` means nothing
    /// arrived at all.
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Write all of `data` and flush it
    fn send(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Accumulates raw bytes and splits them on `\n`
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the first complete line, without its `\n`
    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        Some(line)
    }

    /// Remove and return whatever is buffered, terminated or not
    pub fn take_partial(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

//! Newline framing for the byte-stream transport.
//!
//! Every transmitted unit is UTF-8 text followed by a single `\n`. There is no
//! escaping, length prefix or checksum. Received lines are decoded with invalid
//! UTF-8 sequences dropped and trailing whitespace (including any `\r`)
//! stripped.

use std::collections::VecDeque;

/// Byte that terminates every line on the wire.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest partial line buffered before it is flushed as a line of its own.
pub const MAX_PENDING_LINE: usize = 64 * 1024;

/// Encode one line of text for transmission.
pub fn encode_line(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(LINE_TERMINATOR);
    bytes
}

/// Decode one received line.
///
/// Invalid UTF-8 is skipped rather than replaced, and trailing whitespace is
/// removed. A bare terminator decodes to the empty string.
pub fn decode_line(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    text
}

/// Buffers transport bytes and yields complete lines.
///
/// Bytes may arrive in arbitrary chunks; a line is released only once its
/// terminator has been seen. Lines come out decoded by [`decode_line`].
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    complete: VecDeque<String>,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self { buffer: Vec::with_capacity(256), complete: VecDeque::new() }
    }

    /// Feed received bytes. Returns the number of lines completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let mut completed = 0;
        for &b in bytes {
            self.buffer.push(b);
            if b == LINE_TERMINATOR {
                self.complete.push_back(decode_line(&self.buffer));
                self.buffer.clear();
                completed += 1;
            } else if self.buffer.len() >= MAX_PENDING_LINE {
                tracing::warn!(len = self.buffer.len(), "line exceeds buffer limit, flushing");
                self.complete.push_back(decode_line(&self.buffer));
                self.buffer.clear();
                completed += 1;
            }
        }
        completed
    }

    /// Take the oldest complete line, if any.
    pub fn next_line(&mut self) -> Option<String> {
        self.complete.pop_front()
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop buffered bytes and undelivered lines.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.complete.clear();
    }
}

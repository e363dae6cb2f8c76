// ABOUTME: Fixed-capacity byte buffer for captured command output.
// ABOUTME: Stops accepting bytes at capacity and records that truncation happened.

use std::fmt;

/// Default capacity of a command's captured output, in bytes.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 1023;

/// Captured output with an explicit capacity.
///
/// NUL bytes are dropped on append, so the stored bytes are always NUL-free.
/// Once `capacity` bytes are stored, further appends are discarded and the
/// buffer is marked truncated.
#[derive(Clone, PartialEq, Eq)]
pub struct BoundedOutput {
    bytes: Vec<u8>,
    capacity: usize,
    truncated: bool,
}

impl BoundedOutput {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity.min(DEFAULT_OUTPUT_CAPACITY)),
            capacity,
            truncated: false,
        }
    }

    /// Append a chunk, returning how many bytes were kept.
    pub fn append(&mut self, chunk: &[u8]) -> usize {
        let mut kept = 0;
        for &byte in chunk {
            if byte == 0 {
                continue;
            }
            if self.bytes.len() == self.capacity {
                self.truncated = true;
                break;
            }
            self.bytes.push(byte);
            kept += 1;
        }
        kept
    }

    pub fn is_full(&self) -> bool {
        self.bytes.len() == self.capacity
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Output decoded as UTF-8, replacing invalid sequences.
    ///
    /// When truncation cut a multibyte character short, the partial
    /// character is left out of the text.
    pub fn to_text(&self) -> String {
        let end = if self.truncated {
            complete_len(&self.bytes)
        } else {
            self.bytes.len()
        };
        String::from_utf8_lossy(&self.bytes[..end]).into_owned()
    }
}

/// Length of `bytes` without a trailing incomplete UTF-8 sequence.
fn complete_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let Some(lead) = (len.saturating_sub(4)..len)
        .rev()
        .find(|&i| bytes[i] & 0xC0 != 0x80)
    else {
        return len;
    };
    let width = match bytes[lead] {
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        b if b >= 0xC0 => 2,
        _ => 1,
    };
    if len - lead < width { lead } else { len }
}

impl Default for BoundedOutput {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_CAPACITY)
    }
}

impl fmt::Debug for BoundedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedOutput")
            .field("text", &String::from_utf8_lossy(&self.bytes))
            .field("capacity", &self.capacity)
            .field("truncated", &self.truncated)
            .finish()
    }
}

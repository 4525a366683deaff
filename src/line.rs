//! Line assembler for command input

use crate::ascii::{BS, CAN, CR, DEL, EOF, EOT};
use crate::config::LINE_BUFFER_SIZE;

/// Result of feeding one byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStatus {
    /// More input needed
    Pending,
    /// Terminator seen, line available via [`LineAssembler::line`]
    Complete,
    /// Cancel byte seen, accumulated input discarded
    Aborted,
}

/// Editable input line
///
/// Printable bytes are accumulated, BS/DEL erase, CR/EOF/EOT terminate and
/// CAN aborts. Input past the capacity is dropped.
pub struct LineAssembler {
    buf: [u8; LINE_BUFFER_SIZE],
    len: usize,
    /// Last feed completed a line; the next feed starts a new one
    done: bool,
}

impl LineAssembler {
    /// Create empty assembler
    pub const fn new() -> Self {
        Self {
            buf: [0u8; LINE_BUFFER_SIZE],
            len: 0,
            done: false,
        }
    }

    /// Process a single input byte
    pub fn feed(&mut self, byte: u8) -> LineStatus {
        if self.done {
            self.len = 0;
            self.done = false;
        }

        match byte {
            CR | EOF | EOT => {
                self.done = true;
                LineStatus::Complete
            }
            CAN => {
                self.len = 0;
                LineStatus::Aborted
            }
            BS | DEL => {
                self.len = self.len.saturating_sub(1);
                LineStatus::Pending
            }
            b if b > 31 => {
                if self.len < LINE_BUFFER_SIZE {
                    self.buf[self.len] = b;
                    self.len += 1;
                }
                LineStatus::Pending
            }
            _ => LineStatus::Pending,
        }
    }

    /// Completed line, `None` if it was empty or is not complete yet
    pub fn line(&self) -> Option<&[u8]> {
        if self.done && self.len > 0 {
            Some(&self.buf[..self.len])
        } else {
            None
        }
    }

    /// Bytes accumulated so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Discard any partial input
    pub fn clear(&mut self) {
        self.len = 0;
        self.done = false;
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

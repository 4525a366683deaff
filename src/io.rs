//! Byte-oriented write helpers shared by the buffered and unbuffered ports.

use crate::ascii::EOL;

/// Blocking byte sink.
///
/// Implementors provide [`put_byte`](Self::put_byte); the string helpers are
/// thin loops over it.
pub trait SerialWrite {
    /// Send one byte, blocking until the transport accepts it.
    fn put_byte(&mut self, byte: u8);

    fn write_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.put_byte(byte);
        }
    }

    fn write_str(&mut self, text: &str) {
        self.write_bytes(text.as_bytes());
    }

    /// Write `text` followed by CR LF.
    fn write_line(&mut self, text: &str) {
        self.write_str(text);
        self.write_str(EOL);
    }
}

//! Log output over the serial port itself.
//!
//! Entries queued by the interrupt handler (and the application) are
//! formatted and written through the normal transmit path from the main
//! loop, where blocking is allowed.
//!
//! ```text
//! LogStream ──▶ drain_log() ──▶ put_byte ──▶ tx ring ──▶ UART TX
//! ```

use core::fmt::Write;

use crate::io::SerialWrite;
use crate::logging::{BufWriter, LogEntry, LogStream};

/// Formatted line capacity.
pub const FORMAT_BUF_SIZE: usize = 128;

/// Format log entry to bytes.
///
/// Format: `[timestamp_us] LEVEL: message\r\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };

    let _ = write!(
        writer,
        "[{:10}] {}: {}\r\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    );

    writer.pos
}

/// Write every queued entry of `stream` to `out`.
///
/// Reports and resets the dropped counter afterwards. Returns the number of
/// entries written.
pub fn drain_log<W: SerialWrite, const N: usize>(out: &mut W, stream: &LogStream<N>) -> usize {
    let mut format_buf = [0u8; FORMAT_BUF_SIZE];
    let mut count = 0;

    while let Some(entry) = stream.drain() {
        let len = format_log_entry(&entry, &mut format_buf);
        out.write_bytes(&format_buf[..len]);
        count += 1;
    }

    let dropped = stream.dropped();
    if dropped > 0 {
        let mut writer = BufWriter { buf: &mut format_buf, pos: 0 };
        let _ = write!(writer, "[WARN] Dropped: {}\r\n", dropped);
        let len = writer.pos;
        out.write_bytes(&format_buf[..len]);
        stream.reset_dropped();
    }

    count
}

//! Interrupt-safe logging for the serial transport.
//!
//! # Architecture
//!
//! ```text
//! UART ISR / app          LogStream             App main loop
//! ──────────────          ─────────             ─────────────
//!
//! rt_warn!() ──────────▶ [L0][L1][L2] ──────▶ drain_log() ──▶ serial TX
//! non-blocking            lock-free            blocking ok
//! ```
//!
//! # Rules
//!
//! - The interrupt handler never formats into the transmit ring directly
//! - Producers never block; entries are dropped (and counted) if full
//! - A dropped entry never corrupts entries already queued

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 80;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    pub const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, or a placeholder if it is not valid UTF-8.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

struct Slot {
    /// Set by the producer once `entry` is complete.
    ready: AtomicBool,
    entry: UnsafeCell<LogEntry>,
}

impl Slot {
    const EMPTY: Self = Self {
        ready: AtomicBool::new(false),
        entry: UnsafeCell::new(LogEntry::EMPTY),
    };
}

/// Lock-free log stream (multiple producers, single consumer).
///
/// Both the interrupt handler and the application push; only the
/// application drains.
/// - Producers reserve a slot with a compare-exchange on `write_idx`
/// - A slot is published by its `ready` flag, so a preempted producer never
///   exposes a half-written entry
/// - Push never blocks (drops message if full)
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    slots: [Slot; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Producers own a slot exclusively between reservation and
// publication; the single consumer only reads published slots.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            slots: [const { Slot::EMPTY }; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry (interrupt-safe, never blocks).
    ///
    /// Returns `true` if message was queued, `false` if dropped (ring full).
    ///
    /// # Timing
    ///
    /// Completes in O(1) apart from a retry if another producer races the
    /// reservation.
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let slot = &self.slots[(write as usize) & Self::MASK];

        // SAFETY: The reservation above makes this producer the only writer
        // of the slot until `ready` is set.
        unsafe {
            let entry = &mut *slot.entry.get();
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        slot.ready.store(true, Ordering::Release);
        true
    }

    /// Drain next log entry (application only).
    ///
    /// Returns `None` if no entries available, or if the oldest entry is
    /// still being written by a preempted producer.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let slot = &self.slots[(read as usize) & Self::MASK];
        if !slot.ready.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: Slot is published and the single consumer owns it until
        // `read_idx` moves past it.
        let entry = unsafe { *slot.entry.get() };

        slot.ready.store(false, Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() != 0
    }

    /// Get number of entries reserved but not yet drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Crate-wide log stream used unless [`Serial::with_log_stream`] picks another.
///
/// [`Serial::with_log_stream`]: crate::serial::Serial::with_log_stream
pub static SERIAL_LOG: LogStream = LogStream::new();

/// Format a message into a buffer.
///
/// Returns the number of bytes written. Output is truncated to the buffer.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Truncating `fmt::Write` over a byte slice.
pub(crate) struct BufWriter<'a> {
    pub(crate) buf: &'a mut [u8],
    pub(crate) pos: usize,
}

impl<'a> core::fmt::Write for BufWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Interrupt-safe log macro.
///
/// Use this in the interrupt handler instead of any blocking output.
///
/// # Example
///
/// ```ignore
/// rt_log!(LogLevel::Warn, log, hw.now_us(), "rx overflow #{}", count);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

/// Interrupt-safe info log.
#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// Interrupt-safe warning log.
#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// Interrupt-safe error log.
#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Interrupt-safe debug log.
#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"rx flushed"));
        assert!(stream.has_entries());
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), "rx flushed");

        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_full_keeps_queued_entries() {
        let stream = LogStream::<4>::new();

        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);
        assert_eq!(stream.pending(), 4);

        // Drain one, should be able to push again
        assert_eq!(stream.drain().unwrap().message(), "1");
        assert!(stream.push(6, LogLevel::Info, b"6"));

        let rest: Vec<i64> = core::iter::from_fn(|| stream.drain())
            .map(|e| e.timestamp_us)
            .collect();
        assert_eq!(rest, vec![2, 3, 4, 6]);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<4>::new();
        let long = [b'x'; MAX_MSG_LEN + 20];

        assert!(stream.push(0, LogLevel::Debug, &long));
        assert_eq!(stream.drain().unwrap().len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let len = format_to_buffer(&mut buf, format_args!("overflow #{}", 42));
        assert_eq!(&buf[..len], b"overflow #42");
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 4];
        let len = format_to_buffer(&mut buf, format_args!("{}", 123456));
        assert_eq!(&buf[..len], b"1234");
    }

    #[test]
    fn test_rt_macro_pushes() {
        let stream = LogStream::<4>::new();
        crate::rt_warn!(stream, 77, "flow {}", "paused");

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.message(), "flow paused");
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_multiple_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let mut handles = vec![];

        for i in 0..4 {
            let stream = Arc::clone(&stream);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let msg = format!("producer {} msg {}", i, j);
                    stream.push(j as i64, LogLevel::Info, msg.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while let Some(entry) = stream.drain() {
            assert!(entry.message().starts_with("producer "));
            count += 1;
        }
        assert_eq!(count, 40, "All messages should be present");
    }
}

//! Receive-path status flags.
//!
//! Overflow is a silent-drop policy: the interrupt handler never waits for
//! the application, so a byte that finds the ring full is lost. The loss is
//! latched here for the application to poll.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Sticky overflow flag plus diagnostic counters.
///
/// Written by the interrupt handler, read and cleared by the application.
///
/// # Usage
///
/// ```ignore
/// // In the receive interrupt:
/// if ring_full {
///     status.record_overflow();
/// }
///
/// // In the application:
/// if port.take_overflow() {
///     // resynchronise the protocol above
/// }
/// ```
pub struct RxStatus {
    /// True until explicitly cleared.
    overflow: AtomicBool,

    /// Bytes lost to overflow since boot (never cleared).
    overflow_count: AtomicU32,

    /// Bytes rejected by the receive filter since boot (never cleared).
    filtered_count: AtomicU32,
}

impl RxStatus {
    pub const fn new() -> Self {
        Self {
            overflow: AtomicBool::new(false),
            overflow_count: AtomicU32::new(0),
            filtered_count: AtomicU32::new(0),
        }
    }

    /// Latch an overflow.
    ///
    /// Returns true if this starts a new overflow episode (flag was clear).
    #[inline]
    pub fn record_overflow(&self) -> bool {
        self.overflow_count.fetch_add(1, Ordering::Relaxed);
        !self.overflow.swap(true, Ordering::AcqRel)
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.filtered_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn overflow(&self) -> bool {
        self.overflow.load(Ordering::Acquire)
    }

    /// Read and clear the overflow flag.
    #[inline]
    pub fn take_overflow(&self) -> bool {
        self.overflow.swap(false, Ordering::AcqRel)
    }

    /// Clear the overflow flag. Counters are preserved for diagnostics.
    #[inline]
    pub fn clear_overflow(&self) {
        self.overflow.store(false, Ordering::Release);
    }

    #[inline]
    pub fn overflow_count(&self) -> u32 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u32 {
        self.filtered_count.load(Ordering::Relaxed)
    }
}

impl Default for RxStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the receive path at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RxStatusSnapshot {
    pub overflow: bool,
    pub overflow_count: u32,
    pub filtered_count: u32,
    pub flow_paused: bool,
    pub buffered: usize,
}

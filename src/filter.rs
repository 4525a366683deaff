//! Receive admission filter.
//!
//! The interrupt handler asks the installed filter about every byte before
//! it enters the receive ring. Returning `false` drops the byte silently,
//! which is how in-band control bytes (abort, reset) are intercepted before
//! they queue up behind normal traffic.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

/// Admit/drop decision for one received byte.
///
/// Runs in interrupt context: must not block, must be short.
pub trait ReceiveFilter: Sync {
    fn admit(&self, byte: u8) -> bool;
}

impl<F> ReceiveFilter for F
where
    F: Fn(u8) -> bool + Sync,
{
    fn admit(&self, byte: u8) -> bool {
        self(byte)
    }
}

/// Swappable filter cell shared by the application and the interrupt.
///
/// The pointer is read and replaced inside a critical section, so a swap can
/// never be observed half-done. The filter itself runs outside of it.
pub struct FilterSlot {
    current: Mutex<Cell<Option<&'static dyn ReceiveFilter>>>,
}

impl FilterSlot {
    pub const fn new() -> Self {
        Self {
            current: Mutex::new(Cell::new(None)),
        }
    }

    /// Install `filter` (or remove with `None`), returning the previous one.
    pub fn replace(
        &self,
        filter: Option<&'static dyn ReceiveFilter>,
    ) -> Option<&'static dyn ReceiveFilter> {
        critical_section::with(|cs| self.current.borrow(cs).replace(filter))
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.current.borrow(cs).get().is_some())
    }

    /// True if `byte` may enter the ring. No filter admits everything.
    #[inline]
    pub fn admit(&self, byte: u8) -> bool {
        let filter = critical_section::with(|cs| self.current.borrow(cs).get());
        filter.map_or(true, |f| f.admit(byte))
    }
}

impl Default for FilterSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter that swallows one control byte and latches that it was seen.
///
/// # Usage
///
/// ```ignore
/// static ABORT: Intercept = Intercept::new(ascii::CAN);
///
/// port.set_receive_filter(Some(&ABORT));
///
/// // In the main loop:
/// if ABORT.take() {
///     stop_motion();
/// }
/// ```
pub struct Intercept {
    byte: u8,
    seen: AtomicBool,
}

impl Intercept {
    pub const fn new(byte: u8) -> Self {
        Self {
            byte,
            seen: AtomicBool::new(false),
        }
    }

    /// Read and clear the latch.
    pub fn take(&self) -> bool {
        self.seen.swap(false, Ordering::AcqRel)
    }

    pub fn is_set(&self) -> bool {
        self.seen.load(Ordering::Acquire)
    }
}

impl ReceiveFilter for Intercept {
    fn admit(&self, byte: u8) -> bool {
        if byte == self.byte {
            self.seen.store(true, Ordering::Release);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii;

    fn no_zero(byte: u8) -> bool {
        byte != 0
    }

    static NO_ZERO: fn(u8) -> bool = no_zero;

    #[test]
    fn test_empty_slot_admits_everything() {
        let slot = FilterSlot::new();
        assert!(!slot.is_installed());
        assert!((0..=255u8).all(|b| slot.admit(b)));
    }

    #[test]
    fn test_fn_filter() {
        let slot = FilterSlot::new();
        slot.replace(Some(&NO_ZERO));

        assert!(slot.is_installed());
        assert!(!slot.admit(0));
        assert!(slot.admit(b'a'));
    }

    #[test]
    fn test_replace_returns_previous() {
        static ABORT: Intercept = Intercept::new(ascii::CAN);
        let slot = FilterSlot::new();

        assert!(slot.replace(Some(&ABORT)).is_none());
        assert!(slot.replace(None).is_some());
        assert!(slot.admit(ascii::CAN));
    }

    #[test]
    fn test_intercept_latches() {
        let abort = Intercept::new(ascii::CAN);

        assert!(abort.admit(b'x'));
        assert!(!abort.is_set());
        assert!(!abort.admit(ascii::CAN));
        assert!(abort.take());
        assert!(!abort.take());
    }
}

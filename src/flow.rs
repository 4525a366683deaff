//! Watermark flow control for the receive path.
//!
//! ```text
//! occupancy ─┬─ N-1
//!            ├─ high ── assert (interrupt side, on arrival)
//!            │          hysteresis band: no change
//!            ├─ low ─── release (application side, on read)
//!            └─ 0
//! ```
//!
//! The interrupt handler is the only context that asserts, the application
//! is the only context that releases. Each side performs a single store on
//! the shared flag, never a read-modify-write.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::Watermarks;
use crate::hal::UartHardware;

/// Flow-control state machine.
pub struct FlowController {
    /// Remote sender currently paused (signal asserted).
    paused: AtomicBool,
    marks: Watermarks,
    enabled: bool,
}

impl FlowController {
    /// `enabled = false` leaves the signal permanently released.
    pub const fn new(marks: Watermarks, enabled: bool) -> Self {
        Self {
            paused: AtomicBool::new(false),
            marks,
            enabled,
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn watermarks(&self) -> Watermarks {
        self.marks
    }

    /// Interrupt side, after a receive event.
    ///
    /// Returns true if the signal was asserted by this call.
    #[inline]
    pub fn on_receive<H: UartHardware>(&self, occupancy: usize, hw: &H) -> bool {
        if !self.enabled || self.is_paused() || occupancy < self.marks.high {
            return false;
        }
        // Line before flag: a release that sees `paused` also sees the line
        // asserted, so it can never be left high with `paused` clear.
        hw.set_flow_signal(true);
        self.paused.store(true, Ordering::Release);
        true
    }

    /// Application side, after a successful read.
    ///
    /// Returns true if the signal was released by this call.
    #[inline]
    pub fn on_read<H: UartHardware>(&self, occupancy: usize, hw: &H) -> bool {
        if !self.is_paused() || occupancy > self.marks.low {
            return false;
        }
        self.release(hw);
        true
    }

    /// Application side, unconditional release (flush, cancel).
    #[inline]
    pub fn release<H: UartHardware>(&self, hw: &H) {
        if !self.enabled {
            return;
        }
        // Line first: an arrival between the two stores sees `paused` still
        // set and leaves the line alone, instead of being overwritten here.
        hw.set_flow_signal(false);
        self.paused.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerialConfig;
    use crate::hal::IrqFlags;
    use core::cell::Cell;

    #[derive(Default)]
    struct Line {
        level: Cell<bool>,
        toggles: Cell<u32>,
    }

    impl UartHardware for Line {
        type Error = ();
        fn configure(&mut self, _config: &SerialConfig) -> Result<(), ()> {
            Ok(())
        }
        fn try_write(&self, _byte: u8) -> bool {
            true
        }
        fn read(&self) -> u8 {
            0
        }
        fn rx_ready(&self) -> bool {
            false
        }
        fn set_flow_signal(&self, asserted: bool) {
            if self.level.get() != asserted {
                self.toggles.set(self.toggles.get() + 1);
            }
            self.level.set(asserted);
        }
        fn enable_irq(&self, _sources: IrqFlags) {}
        fn disable_irq(&self, _sources: IrqFlags) {}
        fn irq_status(&self) -> IrqFlags {
            IrqFlags::NONE
        }
    }

    #[test]
    fn test_asserts_at_high_watermark() {
        let flow = FlowController::new(Watermarks::new(12, 4), true);
        let line = Line::default();

        assert!(!flow.on_receive(11, &line));
        assert!(!line.level.get());
        assert!(flow.on_receive(12, &line));
        assert!(line.level.get());
        assert!(flow.is_paused());

        // Already paused: no second assertion
        assert!(!flow.on_receive(13, &line));
        assert_eq!(line.toggles.get(), 1);
    }

    #[test]
    fn test_hysteresis_band() {
        let flow = FlowController::new(Watermarks::new(12, 4), true);
        let line = Line::default();

        flow.on_receive(12, &line);
        for occupancy in (5..12).rev() {
            assert!(!flow.on_read(occupancy, &line));
            assert!(line.level.get());
        }
        assert!(flow.on_read(4, &line));
        assert!(!line.level.get());

        // Below high again: stays released while climbing back up
        for occupancy in 5..12 {
            assert!(!flow.on_receive(occupancy, &line));
        }
        assert_eq!(line.toggles.get(), 2);
    }

    /// Records the flag as seen from inside `set_flow_signal`.
    struct Ordered<'a> {
        flow: &'a FlowController,
        paused_at_assert: Cell<Option<bool>>,
    }

    impl UartHardware for Ordered<'_> {
        type Error = ();
        fn configure(&mut self, _config: &SerialConfig) -> Result<(), ()> {
            Ok(())
        }
        fn try_write(&self, _byte: u8) -> bool {
            true
        }
        fn read(&self) -> u8 {
            0
        }
        fn rx_ready(&self) -> bool {
            false
        }
        fn set_flow_signal(&self, asserted: bool) {
            if asserted {
                self.paused_at_assert.set(Some(self.flow.is_paused()));
            }
        }
        fn enable_irq(&self, _sources: IrqFlags) {}
        fn disable_irq(&self, _sources: IrqFlags) {}
        fn irq_status(&self) -> IrqFlags {
            IrqFlags::NONE
        }
    }

    #[test]
    fn test_line_driven_before_flag_on_assert() {
        let flow = FlowController::new(Watermarks::new(12, 4), true);
        let hw = Ordered {
            flow: &flow,
            paused_at_assert: Cell::new(None),
        };

        assert!(flow.on_receive(12, &hw));
        assert_eq!(hw.paused_at_assert.get(), Some(false));
        assert!(flow.is_paused());
    }

    #[test]
    fn test_disabled_never_asserts() {
        let flow = FlowController::new(Watermarks::new(12, 4), false);
        let line = Line::default();

        assert!(!flow.on_receive(15, &line));
        assert!(!flow.is_paused());
        assert_eq!(line.toggles.get(), 0);
    }
}

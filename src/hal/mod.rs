//! Hardware Abstraction Layer for the serial transport.
//!
//! The transport never touches registers itself. Everything it needs from
//! the peripheral is a handful of primitives on [`UartHardware`]; business
//! logic stays in the core modules, the HAL is just I/O.
//!
//! Every primitive except [`UartHardware::configure`] takes `&self`: the
//! application and the interrupt handler both hold a shared reference, the
//! same way both sides of a real driver reach the same register block.

#[cfg(feature = "esp32")]
pub mod esp32;

use core::ops::BitOr;

use crate::config::SerialConfig;

/// Interrupt source bits.
///
/// Bit 0: transmit ready (FIFO has space)
/// Bit 1: receive ready (FIFO level reached)
/// Bit 2: receive timeout (bytes idle in FIFO)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IrqFlags(u8);

impl IrqFlags {
    pub const NONE: Self = Self(0);
    pub const TX: Self = Self(0x01);
    pub const RX: Self = Self(0x02);
    pub const RT: Self = Self(0x04);
    /// Both receive conditions
    pub const RX_ANY: Self = Self(Self::RX.0 | Self::RT.0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x07)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// True if any bit of `other` is set in `self`.
    pub const fn intersects(&self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for IrqFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Primitive UART operations consumed by the transport.
pub trait UartHardware {
    /// Error reported by [`configure`](Self::configure).
    type Error: core::fmt::Debug;

    /// Clocks, pin mux and line settings. Called once, before anything else.
    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error>;

    /// Transmit one byte if the hardware has space. Returns false otherwise.
    fn try_write(&self, byte: u8) -> bool;

    /// Receive one byte. Clears the pending receive condition.
    fn read(&self) -> u8;

    /// True if a received byte is waiting in the hardware.
    fn rx_ready(&self) -> bool;

    /// Drive the flow-control line. `true` asks the remote sender to pause.
    fn set_flow_signal(&self, asserted: bool);

    fn enable_irq(&self, sources: IrqFlags);

    fn disable_irq(&self, sources: IrqFlags);

    /// Pending sources, masked by the enabled set.
    fn irq_status(&self) -> IrqFlags;

    /// Acknowledge sources that need an explicit clear.
    fn clear_irq(&self, _sources: IrqFlags) {}

    /// Timestamp for log entries.
    fn now_us(&self) -> i64 {
        0
    }

    /// Pause between polls on the unbuffered receive path.
    fn poll_delay(&self) {
        for _ in 0..500 {
            core::hint::spin_loop();
        }
    }
}

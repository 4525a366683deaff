//! ESP-IDF UART backend.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 TX ──────▶ USB-UART RX
//! ESP32 RX ◀────── USB-UART TX
//! RTS GPIO ──────▶ USB-UART CTS   (optional, high = pause)
//! ```
//!
//! The IDF driver owns the real UART interrupt and its FIFOs. Enable bits
//! are kept here and pending sources are derived from driver state, so
//! [`SerialIsr::on_interrupt`](crate::SerialIsr::on_interrupt) is serviced
//! from a high-priority task instead of a vector.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;
use esp_idf_svc::hal::delay::{Ets, NON_BLOCK};
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::hal::uart::{config, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use super::{IrqFlags, UartHardware};
use crate::config::{DataBits, Parity, SerialConfig, StopBits};

type RtsPin<'d> = PinDriver<'d, AnyOutputPin, Output>;

/// Poll interval used by the unbuffered port.
const POLL_DELAY_US: u32 = 10;

/// [`UartHardware`] over an IDF [`UartDriver`].
pub struct EspUart<'d> {
    uart: UartDriver<'d>,
    rts: Mutex<RefCell<Option<RtsPin<'d>>>>,
    enabled: AtomicU8,
}

// SAFETY: the IDF UART driver serialises access to its FIFOs internally,
// the RTS pin sits behind a critical section and the enable bits are atomic.
unsafe impl<'d> Sync for EspUart<'d> {}

impl<'d> EspUart<'d> {
    /// Wrap a driver. `rts` is the flow-control output, if wired.
    pub fn new(uart: UartDriver<'d>, rts: Option<RtsPin<'d>>) -> Self {
        Self {
            uart,
            rts: Mutex::new(RefCell::new(rts)),
            enabled: AtomicU8::new(0),
        }
    }

    fn enabled(&self) -> IrqFlags {
        IrqFlags::from_bits(self.enabled.load(Ordering::Acquire))
    }
}

fn data_bits(bits: DataBits) -> config::DataBits {
    match bits {
        DataBits::Five => config::DataBits::DataBits5,
        DataBits::Six => config::DataBits::DataBits6,
        DataBits::Seven => config::DataBits::DataBits7,
        DataBits::Eight => config::DataBits::DataBits8,
    }
}

fn parity(parity: Parity) -> config::Parity {
    match parity {
        Parity::None => config::Parity::ParityNone,
        Parity::Even => config::Parity::ParityEven,
        Parity::Odd => config::Parity::ParityOdd,
    }
}

fn stop_bits(bits: StopBits) -> config::StopBits {
    match bits {
        StopBits::One => config::StopBits::STOP1,
        StopBits::Two => config::StopBits::STOP2,
    }
}

impl<'d> UartHardware for EspUart<'d> {
    type Error = EspError;

    fn configure(&mut self, config: &SerialConfig) -> Result<(), EspError> {
        self.uart.change_baudrate(Hertz(config.baud_rate))?;
        self.uart.change_data_bits(data_bits(config.data_bits))?;
        self.uart.change_parity(parity(config.parity))?;
        self.uart.change_stop_bits(stop_bits(config.stop_bits))?;
        Ok(())
    }

    fn try_write(&self, byte: u8) -> bool {
        matches!(self.uart.write_nb(&[byte]), Ok(1))
    }

    fn read(&self) -> u8 {
        let mut buf = [0u8; 1];
        match self.uart.read(&mut buf, NON_BLOCK) {
            Ok(1) => buf[0],
            _ => 0,
        }
    }

    fn rx_ready(&self) -> bool {
        matches!(self.uart.remaining_read(), Ok(n) if n > 0)
    }

    /// High tells the peer to pause.
    fn set_flow_signal(&self, asserted: bool) {
        critical_section::with(|cs| {
            if let Some(pin) = self.rts.borrow_ref_mut(cs).as_mut() {
                let _ = if asserted { pin.set_high() } else { pin.set_low() };
            }
        });
    }

    fn enable_irq(&self, sources: IrqFlags) {
        self.enabled.fetch_or(sources.bits(), Ordering::AcqRel);
    }

    fn disable_irq(&self, sources: IrqFlags) {
        self.enabled.fetch_and(!sources.bits(), Ordering::AcqRel);
    }

    /// TX is reported whenever enabled; a full FIFO makes `try_write` fail.
    fn irq_status(&self) -> IrqFlags {
        let enabled = self.enabled();
        let mut pending = IrqFlags::NONE;
        if enabled.contains(IrqFlags::TX) {
            pending = pending | IrqFlags::TX;
        }
        if enabled.intersects(IrqFlags::RX_ANY) && self.rx_ready() {
            pending = pending | IrqFlags::RX;
        }
        pending
    }

    fn now_us(&self) -> i64 {
        unsafe { esp_idf_svc::sys::esp_timer_get_time() }
    }

    fn poll_delay(&self) {
        Ets::delay_us(POLL_DELAY_US);
    }
}

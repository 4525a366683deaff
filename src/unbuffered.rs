//! Unbuffered serial port.
//!
//! The configuration without rings or interrupts: every call goes straight
//! to the hardware. Writes spin until the transmitter has room; reads poll
//! with a bounded retry budget and time out instead of blocking forever.

use core::fmt;

use crate::config::{SerialConfig, UNBUFFERED_RETRY_BUDGET};
use crate::error::SerialError;
use crate::hal::UartHardware;
use crate::io::SerialWrite;
use crate::logging::SERIAL_LOG;
use crate::rt_error;

/// Polled serial port.
pub struct Unbuffered<H: UartHardware> {
    hw: H,
    retry_budget: u32,
}

impl<H: UartHardware> Unbuffered<H> {
    /// Validate `config` and configure the hardware. No interrupt is enabled.
    pub fn new(mut hw: H, config: SerialConfig) -> Result<Self, SerialError> {
        config.validate_line()?;

        if let Err(e) = hw.configure(&config) {
            rt_error!(SERIAL_LOG, hw.now_us(), "uart configure failed: {:?}", e);
            return Err(SerialError::Hardware);
        }

        Ok(Self {
            hw,
            retry_budget: UNBUFFERED_RETRY_BUDGET,
        })
    }

    /// Override the number of polls made by [`get_byte`](Self::get_byte).
    pub fn with_retry_budget(mut self, retries: u32) -> Self {
        self.retry_budget = retries;
        self
    }

    /// Poll for one byte, giving up with [`SerialError::Timeout`].
    pub fn get_byte(&mut self) -> Result<u8, SerialError> {
        for _ in 0..self.retry_budget {
            if self.hw.rx_ready() {
                return Ok(self.hw.read());
            }
            self.hw.poll_delay();
        }
        Err(SerialError::Timeout)
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn release(self) -> H {
        self.hw
    }
}

impl<H: UartHardware> SerialWrite for Unbuffered<H> {
    /// Spin until the transmitter takes the byte.
    fn put_byte(&mut self, byte: u8) {
        while !self.hw.try_write(byte) {
            core::hint::spin_loop();
        }
    }
}

impl<H: UartHardware> fmt::Write for Unbuffered<H> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

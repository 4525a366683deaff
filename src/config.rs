//! Module: config
//!
//! Purpose: Line settings, buffer sizes and flow-control watermarks.
//!
//! Architecture:
//! - Buffer sizes are compile-time constants (const generics on [`Serial`])
//! - Line settings are handed to the hardware once, at init
//! - Watermarks are validated against the receive capacity at init
//!
//! Safety: Safe. Plain data, no unsafe blocks.
//!
//! [`Serial`]: crate::serial::Serial

use crate::error::ConfigError;

/// Transmit ring size. Must be a power of 2.
pub const TX_BUFFER_SIZE: usize = 128;

/// Receive ring size. Must be a power of 2.
pub const RX_BUFFER_SIZE: usize = 1024;

/// Receive high watermark for the default ring size.
pub const RX_BUFFER_HWM: usize = 900;

/// Receive low watermark for the default ring size.
pub const RX_BUFFER_LWM: usize = 300;

/// Line assembler capacity in bytes.
pub const LINE_BUFFER_SIZE: usize = 64;

/// Polls made by the unbuffered receive path before giving up.
pub const UNBUFFERED_RETRY_BUDGET: u32 = 3000;

/// Word length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    pub const fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Hardware flow-control wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowControl {
    /// No flow-control line; the signal is never asserted.
    None,
    /// RTS driven from a GPIO (port index, pin number).
    Rts { port: u8, pin: u8 },
}

/// Receive occupancy thresholds.
///
/// The signal is asserted at `occupancy >= high` and released at
/// `occupancy <= low`. The gap between them is the hysteresis band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Watermarks {
    pub high: usize,
    pub low: usize,
}

impl Watermarks {
    /// Thresholds for the default 1024-byte ring.
    pub const DEFAULT: Self = Self {
        high: RX_BUFFER_HWM,
        low: RX_BUFFER_LWM,
    };

    pub const fn new(high: usize, low: usize) -> Self {
        Self { high, low }
    }

    /// Scale the default thresholds (900 / 300 of 1024) to `capacity`.
    pub const fn for_capacity(capacity: usize) -> Self {
        Self {
            high: capacity * RX_BUFFER_HWM / RX_BUFFER_SIZE,
            low: capacity * RX_BUFFER_LWM / RX_BUFFER_SIZE,
        }
    }

    /// Check `low < high < capacity`.
    pub fn validate(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.low >= self.high {
            return Err(ConfigError::WatermarkOrder {
                high: self.high,
                low: self.low,
            });
        }
        if self.high >= capacity {
            return Err(ConfigError::WatermarkTooHigh {
                high: self.high,
                capacity,
            });
        }
        Ok(())
    }
}

impl Default for Watermarks {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Serial port configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// `None` scales the defaults to the receive ring size.
    pub watermarks: Option<Watermarks>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            watermarks: None,
        }
    }
}

impl SerialConfig {
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub const fn with_format(mut self, data_bits: DataBits, parity: Parity, stop_bits: StopBits) -> Self {
        self.data_bits = data_bits;
        self.parity = parity;
        self.stop_bits = stop_bits;
        self
    }

    pub const fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub const fn with_watermarks(mut self, watermarks: Watermarks) -> Self {
        self.watermarks = Some(watermarks);
        self
    }

    /// Watermarks in effect for a receive ring of `capacity` bytes.
    pub fn watermarks_for(&self, capacity: usize) -> Watermarks {
        self.watermarks
            .unwrap_or_else(|| Watermarks::for_capacity(capacity))
    }

    /// Validate line settings only (unbuffered port).
    pub fn validate_line(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        Ok(())
    }

    /// Validate against a receive ring of `rx_capacity` bytes.
    pub fn validate(&self, rx_capacity: usize) -> Result<(), ConfigError> {
        self.validate_line()?;
        self.watermarks_for(rx_capacity).validate(rx_capacity)
    }
}

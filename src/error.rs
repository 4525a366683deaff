//! Serial error types

use thiserror::Error;

/// Transport error with code and message.
///
/// No variant is fatal. Receive overflow is never returned from a call; it
/// is latched in [`RxStatus`](crate::status::RxStatus) and polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerialError {
    /// S01: Nothing buffered (advisory)
    #[error("no data available")]
    NoDataAvailable,
    /// S02: Receive byte discarded, ring full
    #[error("receive buffer overflow")]
    BufferOverflow,
    /// S03: Unbuffered receive gave up after its retry budget
    #[error("receive timed out")]
    Timeout,
    /// S04: Configuration rejected at init
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// S05: Hardware collaborator failed to configure
    #[error("hardware configuration failed")]
    Hardware,
}

impl SerialError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoDataAvailable => "S01",
            Self::BufferOverflow => "S02",
            Self::Timeout => "S03",
            Self::InvalidConfig(_) => "S04",
            Self::Hardware => "S05",
        }
    }
}

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("baud rate must be non-zero")]
    ZeroBaudRate,
    #[error("low watermark {low} must be below high watermark {high}")]
    WatermarkOrder { high: usize, low: usize },
    #[error("high watermark {high} must be below capacity {capacity}")]
    WatermarkTooHigh { high: usize, capacity: usize },
}

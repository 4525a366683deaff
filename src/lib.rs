//! # uart-ring
//!
//! Interrupt-driven UART transport with lock-free SPSC rings.
//!
//! ## Architecture
//!
//! All bytes flow through two [`RingBuffer`]s, one per direction. Roles are
//! fixed by type:
//! - [`SerialIsr`] produces received bytes and consumes bytes to transmit
//! - [`SerialPort`] consumes received bytes and produces bytes to transmit
//! - No locks: each ring index has exactly one writer
//!
//! Receive overrun is prevented by [`FlowController`], which drives the
//! hardware flow-control line from the receive ring's watermarks.

#![cfg_attr(not(test), no_std)]

pub mod ascii;
pub mod config;
pub mod error;
pub mod filter;
pub mod flow;
pub mod hal;
pub mod io;
#[cfg(feature = "line-input")]
pub mod line;
pub mod log_drain;
pub mod logging;
pub mod ring;
pub mod serial;
pub mod status;
pub mod unbuffered;

pub use config::{DataBits, FlowControl, Parity, SerialConfig, StopBits, Watermarks};
pub use error::{ConfigError, SerialError};
pub use filter::{Intercept, ReceiveFilter};
pub use flow::FlowController;
pub use hal::{IrqFlags, UartHardware};
pub use io::SerialWrite;
#[cfg(feature = "line-input")]
pub use line::LineAssembler;
pub use logging::{LogStream, SERIAL_LOG};
pub use ring::RingBuffer;
pub use serial::{DirectionState, Serial, SerialIsr, SerialPort};
pub use status::RxStatusSnapshot;
pub use unbuffered::Unbuffered;

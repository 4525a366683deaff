//! Interrupt-driven buffered serial port.
//!
//! # Architecture
//!
//! ```text
//!            SerialIsr (interrupt)              SerialPort (application)
//!            ─────────────────────              ────────────────────────
//! UART RX ─▶ rx Producer ──▶ [ rx ring ] ──▶ rx Consumer ─▶ get_byte / read_line
//!                 │                                 │
//!                 └── assert ── FlowController ── release ──┘
//!
//! UART TX ◀─ tx Consumer ◀── [ tx ring ] ◀── tx Producer ◀─ put_byte / write_*
//!                              (fast path: straight to hardware when empty)
//! ```
//!
//! [`Serial`] owns all state. [`Serial::split`] hands out exactly one
//! application handle and one interrupt handle; each holds only its own end
//! of each ring, so neither context can take the other's role.
//!
//! # Concurrency model
//!
//! Single core, two contexts: the application, and a non-reentrant
//! interrupt that can preempt it at any instruction. The transmit fast path
//! and the transmit interrupt gating are only sound under that model.

use core::fmt;

use crate::ascii::CAN;
use crate::config::{FlowControl, SerialConfig, RX_BUFFER_SIZE, TX_BUFFER_SIZE};
use crate::error::SerialError;
use crate::filter::{FilterSlot, ReceiveFilter};
use crate::flow::FlowController;
use crate::hal::{IrqFlags, UartHardware};
use crate::io::SerialWrite;
#[cfg(feature = "line-input")]
use crate::line::{LineAssembler, LineStatus};
use crate::logging::{LogStream, SERIAL_LOG};
use crate::ring::{Consumer, Producer, RingBuffer};
use crate::status::{RxStatus, RxStatusSnapshot};
use crate::{rt_debug, rt_error, rt_info, rt_warn};

/// Per-direction activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionState {
    /// Ring empty, nothing to move
    Idle,
    /// Bytes buffered
    Active,
}

impl DirectionState {
    fn of(empty: bool) -> Self {
        if empty {
            DirectionState::Idle
        } else {
            DirectionState::Active
        }
    }
}

/// Application-side state that must outlive a split.
struct PortState {
    /// `rx_cancel` was called; the next read yields CAN.
    cancel_pending: bool,
    #[cfg(feature = "line-input")]
    line: LineAssembler,
}

/// Buffered serial driver.
///
/// # Usage
///
/// ```ignore
/// let mut serial = Serial::<_, 1024, 128>::new(uart, SerialConfig::default())?;
/// let (mut port, mut isr) = serial.split();
///
/// // Interrupt vector:
/// isr.on_interrupt();
///
/// // Main loop:
/// if let Some(line) = port.read_line() {
///     port.write_line("ok");
/// }
/// ```
pub struct Serial<H: UartHardware, const RX: usize = RX_BUFFER_SIZE, const TX: usize = TX_BUFFER_SIZE> {
    hw: H,
    rx: RingBuffer<RX>,
    tx: RingBuffer<TX>,
    status: RxStatus,
    flow: FlowController,
    filter: FilterSlot,
    log: &'static LogStream,
    port: PortState,
}

impl<H: UartHardware, const RX: usize, const TX: usize> Serial<H, RX, TX> {
    /// Validate `config`, configure the hardware and enable receive interrupts.
    pub fn new(mut hw: H, config: SerialConfig) -> Result<Self, SerialError> {
        config.validate(RX)?;

        if let Err(e) = hw.configure(&config) {
            rt_error!(SERIAL_LOG, hw.now_us(), "uart configure failed: {:?}", e);
            return Err(SerialError::Hardware);
        }

        let flow_enabled = matches!(config.flow_control, FlowControl::Rts { .. });
        if flow_enabled {
            hw.set_flow_signal(false);
        }
        hw.enable_irq(IrqFlags::RX_ANY);

        Ok(Self {
            hw,
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            status: RxStatus::new(),
            flow: FlowController::new(config.watermarks_for(RX), flow_enabled),
            filter: FilterSlot::new(),
            log: &SERIAL_LOG,
            port: PortState {
                cancel_pending: false,
                #[cfg(feature = "line-input")]
                line: LineAssembler::new(),
            },
        })
    }

    /// Send diagnostics to `log` instead of [`SERIAL_LOG`].
    pub fn with_log_stream(mut self, log: &'static LogStream) -> Self {
        self.log = log;
        self
    }

    /// Split into the application handle and the interrupt handle.
    pub fn split(&mut self) -> (SerialPort<'_, H, RX, TX>, SerialIsr<'_, H, RX, TX>) {
        let (rx_producer, rx_consumer) = self.rx.split();
        let (tx_producer, tx_consumer) = self.tx.split();
        let shared = Shared {
            hw: &self.hw,
            status: &self.status,
            flow: &self.flow,
            filter: &self.filter,
            log: self.log,
        };

        (
            SerialPort {
                shared,
                rx: rx_consumer,
                tx: tx_producer,
                state: &mut self.port,
            },
            SerialIsr {
                shared,
                rx: rx_producer,
                tx: tx_consumer,
            },
        )
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Give the hardware back, dropping all buffered data.
    pub fn release(self) -> H {
        self.hw.disable_irq(IrqFlags::TX | IrqFlags::RX_ANY);
        self.hw
    }
}

/// State both handles read.
struct Shared<'a, H> {
    hw: &'a H,
    status: &'a RxStatus,
    flow: &'a FlowController,
    filter: &'a FilterSlot,
    log: &'static LogStream,
}

impl<'a, H> Clone for Shared<'a, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, H> Copy for Shared<'a, H> {}

/// Application handle: receive consumer, transmit producer.
pub struct SerialPort<'a, H: UartHardware, const RX: usize = RX_BUFFER_SIZE, const TX: usize = TX_BUFFER_SIZE> {
    shared: Shared<'a, H>,
    rx: Consumer<'a, RX>,
    tx: Producer<'a, TX>,
    state: &'a mut PortState,
}

impl<'a, H: UartHardware, const RX: usize, const TX: usize> SerialPort<'a, H, RX, TX> {
    /// Oldest received byte, or `None` if nothing is buffered. Never blocks.
    ///
    /// Releases flow control once occupancy drops to the low watermark.
    pub fn get_byte(&mut self) -> Option<u8> {
        if self.state.cancel_pending {
            self.state.cancel_pending = false;
            return Some(CAN);
        }

        let byte = self.rx.dequeue()?;

        let occupancy = self.rx.len();
        if self.shared.flow.on_read(occupancy, self.shared.hw) {
            rt_debug!(self.shared.log, self.shared.hw.now_us(), "flow released at {}", occupancy);
        }
        Some(byte)
    }

    /// [`get_byte`](Self::get_byte) as a `Result`.
    pub fn try_get_byte(&mut self) -> Result<u8, SerialError> {
        self.get_byte().ok_or(SerialError::NoDataAvailable)
    }

    /// Advisory receive occupancy, including a pending cancel sentinel.
    pub fn rx_count(&self) -> usize {
        self.rx.len() + usize::from(self.state.cancel_pending)
    }

    /// Advisory receive space (`RX - 1 - rx_count`).
    pub fn rx_free(&self) -> usize {
        (RX - 1).saturating_sub(self.rx_count())
    }

    /// Advisory transmit occupancy.
    pub fn tx_count(&self) -> usize {
        self.tx.len()
    }

    /// Advisory transmit space.
    pub fn tx_free(&self) -> usize {
        self.tx.free()
    }

    /// True if the next buffered write would have to wait.
    pub fn tx_is_full(&self) -> bool {
        self.tx.is_full()
    }

    /// Discard buffered input and release flow control.
    ///
    /// Also clears the overflow flag. Best-effort: a byte arriving during
    /// the flush may or may not survive it.
    pub fn rx_flush(&mut self) {
        self.discard_input();
        rt_info!(self.shared.log, self.shared.hw.now_us(), "rx flushed");
    }

    /// Discard buffered input; the next read returns CAN.
    pub fn rx_cancel(&mut self) {
        self.discard_input();
        self.state.cancel_pending = true;
        rt_info!(self.shared.log, self.shared.hw.now_us(), "rx cancelled");
    }

    fn discard_input(&mut self) {
        self.state.cancel_pending = false;
        #[cfg(feature = "line-input")]
        self.state.line.clear();
        self.rx.clear();
        self.shared.status.clear_overflow();
        self.shared.flow.release(self.shared.hw);
    }

    /// Install (or remove) the interrupt-side admission filter.
    ///
    /// Returns the previous filter. Safe while interrupts are live.
    pub fn set_receive_filter(
        &self,
        filter: Option<&'static dyn ReceiveFilter>,
    ) -> Option<&'static dyn ReceiveFilter> {
        self.shared.filter.replace(filter)
    }

    pub fn rx_status(&self) -> RxStatusSnapshot {
        let status = self.shared.status;
        RxStatusSnapshot {
            overflow: status.overflow(),
            overflow_count: status.overflow_count(),
            filtered_count: status.filtered_count(),
            flow_paused: self.shared.flow.is_paused(),
            buffered: self.rx_count(),
        }
    }

    /// Read and clear the sticky overflow flag.
    pub fn take_overflow(&self) -> bool {
        self.shared.status.take_overflow()
    }

    /// [`SerialError::BufferOverflow`] if input was lost since the last check.
    pub fn check_overflow(&self) -> Result<(), SerialError> {
        if self.take_overflow() {
            return Err(SerialError::BufferOverflow);
        }
        Ok(())
    }

    pub fn flow_paused(&self) -> bool {
        self.shared.flow.is_paused()
    }

    pub fn rx_state(&self) -> DirectionState {
        DirectionState::of(self.rx_count() == 0)
    }

    pub fn tx_state(&self) -> DirectionState {
        DirectionState::of(self.tx.is_empty())
    }

    pub fn hardware(&self) -> &'a H {
        self.shared.hw
    }

    /// Block until a line terminator arrives.
    ///
    /// Returns `None` for an empty line or when a CAN byte (e.g. from
    /// [`rx_cancel`](Self::rx_cancel)) aborts the line.
    #[cfg(feature = "line-input")]
    pub fn read_line(&mut self) -> Option<&[u8]> {
        loop {
            let Some(byte) = self.get_byte() else {
                core::hint::spin_loop();
                continue;
            };
            match self.state.line.feed(byte) {
                LineStatus::Pending => {}
                LineStatus::Complete => break,
                LineStatus::Aborted => return None,
            }
        }
        self.state.line.line()
    }
}

impl<'a, H: UartHardware, const RX: usize, const TX: usize> SerialWrite for SerialPort<'a, H, RX, TX> {
    /// Queue one byte for transmission.
    ///
    /// With an empty ring the byte goes straight to the hardware if it has
    /// room. Otherwise it is queued, spinning while the ring is full, and the
    /// transmit interrupt is enabled to drain it.
    ///
    /// The empty-ring fast path assumes the interrupt cannot run on another
    /// core at the same time.
    fn put_byte(&mut self, byte: u8) {
        let hw = self.shared.hw;

        if self.tx.is_empty() && hw.try_write(byte) {
            return;
        }

        let mut pending = byte;
        while let Err(byte) = self.tx.enqueue(pending) {
            pending = byte;
            core::hint::spin_loop();
        }

        hw.enable_irq(IrqFlags::TX);
    }
}

impl<'a, H: UartHardware, const RX: usize, const TX: usize> fmt::Write for SerialPort<'a, H, RX, TX> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Interrupt handle: receive producer, transmit consumer.
pub struct SerialIsr<'a, H: UartHardware, const RX: usize = RX_BUFFER_SIZE, const TX: usize = TX_BUFFER_SIZE> {
    shared: Shared<'a, H>,
    rx: Producer<'a, RX>,
    tx: Consumer<'a, TX>,
}

impl<'a, H: UartHardware, const RX: usize, const TX: usize> SerialIsr<'a, H, RX, TX> {
    /// Interrupt entry point.
    ///
    /// Services transmit-ready and receive-ready/timeout independently.
    /// Returns the sources that were pending.
    pub fn on_interrupt(&mut self) -> IrqFlags {
        let pending = self.shared.hw.irq_status();
        self.shared.hw.clear_irq(pending);

        if pending.contains(IrqFlags::TX) {
            self.service_tx();
        }
        if pending.intersects(IrqFlags::RX_ANY) {
            self.service_rx();
        }

        pending
    }

    /// Move queued bytes into the hardware while it has room.
    fn service_tx(&mut self) {
        let hw = self.shared.hw;

        while let Some(byte) = self.tx.peek() {
            if !hw.try_write(byte) {
                break;
            }
            let _ = self.tx.dequeue();
        }

        if self.tx.is_empty() {
            hw.disable_irq(IrqFlags::TX);
            // Producer may have queued between the check and the disable
            if !self.tx.is_empty() {
                hw.enable_irq(IrqFlags::TX);
            }
        }
    }

    /// Take one byte from the hardware.
    fn service_rx(&mut self) {
        let Shared { hw, status, flow, filter, log } = self.shared;

        // Always read: the pending condition only clears once the data
        // register is drained.
        let byte = hw.read();

        if self.rx.is_full() {
            if status.record_overflow() {
                rt_warn!(log, hw.now_us(), "rx overflow, dropped 0x{:02x}", byte);
            }
        } else if filter.admit(byte) {
            let queued = self.rx.enqueue(byte);
            debug_assert!(queued.is_ok(), "rx ring full after is_full check");
        } else {
            status.record_filtered();
        }

        let occupancy = self.rx.len();
        if flow.on_receive(occupancy, hw) {
            rt_debug!(log, hw.now_us(), "flow paused at {}", occupancy);
        }
    }

    pub fn rx_state(&self) -> DirectionState {
        DirectionState::of(self.rx.is_empty())
    }

    pub fn tx_state(&self) -> DirectionState {
        DirectionState::of(self.tx.is_empty())
    }
}

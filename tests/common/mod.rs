//! Mock UART shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;

use uart_ring::{IrqFlags, SerialConfig, SerialIsr, UartHardware};

/// Unlimited transmitter space
pub const UNLIMITED: usize = usize::MAX;

/// UART model with interior mutability, usable from two threads
pub struct MockUart {
    incoming: Mutex<VecDeque<u8>>,
    sent: Mutex<Vec<u8>>,
    tx_room: AtomicUsize,
    enabled: AtomicU8,
    flow: AtomicBool,
    flow_changes: AtomicU32,
    reads: AtomicU32,
    configured: Mutex<Option<SerialConfig>>,
    fail_configure: bool,
}

impl MockUart {
    /// Transmitter full: every write is buffered
    pub fn new() -> Self {
        Self {
            incoming: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            tx_room: AtomicUsize::new(0),
            enabled: AtomicU8::new(0),
            flow: AtomicBool::new(false),
            flow_changes: AtomicU32::new(0),
            reads: AtomicU32::new(0),
            configured: Mutex::new(None),
            fail_configure: false,
        }
    }

    pub fn with_tx_room(self, room: usize) -> Self {
        self.tx_room.store(room, Ordering::SeqCst);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_configure: true,
            ..Self::new()
        }
    }

    pub fn set_tx_room(&self, room: usize) {
        self.tx_room.store(room, Ordering::SeqCst);
    }

    /// Bytes arriving on the wire
    pub fn feed(&self, bytes: &[u8]) {
        self.incoming.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn sent(&self) -> Vec<u8> {
        self.sent.lock().unwrap().clone()
    }

    pub fn irq_enabled(&self, sources: IrqFlags) -> bool {
        IrqFlags::from_bits(self.enabled.load(Ordering::SeqCst)).contains(sources)
    }

    pub fn flow_asserted(&self) -> bool {
        self.flow.load(Ordering::SeqCst)
    }

    /// Number of level changes on the flow-control line
    pub fn flow_changes(&self) -> u32 {
        self.flow_changes.load(Ordering::SeqCst)
    }

    /// Hardware reads performed
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn configured(&self) -> Option<SerialConfig> {
        *self.configured.lock().unwrap()
    }
}

impl UartHardware for MockUart {
    type Error = &'static str;

    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err("clock not running");
        }
        *self.configured.lock().unwrap() = Some(*config);
        Ok(())
    }

    fn try_write(&self, byte: u8) -> bool {
        let room = self.tx_room.load(Ordering::SeqCst);
        if room == 0 {
            return false;
        }
        if room != UNLIMITED {
            self.tx_room.store(room - 1, Ordering::SeqCst);
        }
        self.sent.lock().unwrap().push(byte);
        true
    }

    fn read(&self) -> u8 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.incoming.lock().unwrap().pop_front().unwrap_or(0)
    }

    fn rx_ready(&self) -> bool {
        !self.incoming.lock().unwrap().is_empty()
    }

    fn set_flow_signal(&self, asserted: bool) {
        if self.flow.swap(asserted, Ordering::SeqCst) != asserted {
            self.flow_changes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn enable_irq(&self, sources: IrqFlags) {
        self.enabled.fetch_or(sources.bits(), Ordering::SeqCst);
    }

    fn disable_irq(&self, sources: IrqFlags) {
        self.enabled.fetch_and(!sources.bits(), Ordering::SeqCst);
    }

    fn irq_status(&self) -> IrqFlags {
        let mut raw = IrqFlags::NONE;
        if self.tx_room.load(Ordering::SeqCst) > 0 {
            raw = raw | IrqFlags::TX;
        }
        if self.rx_ready() {
            raw = raw | IrqFlags::RX;
        }
        IrqFlags::from_bits(raw.bits() & self.enabled.load(Ordering::SeqCst))
    }

    fn poll_delay(&self) {}
}

/// Run the interrupt handler until nothing is pending
pub fn pump<const RX: usize, const TX: usize>(isr: &mut SerialIsr<'_, MockUart, RX, TX>) {
    for _ in 0..100_000 {
        if isr.on_interrupt().is_empty() {
            return;
        }
    }
    panic!("interrupt storm: sources never went idle");
}

/// Deliver exactly `n` receive interrupts
pub fn receive<const RX: usize, const TX: usize>(isr: &mut SerialIsr<'_, MockUart, RX, TX>, n: usize) {
    for _ in 0..n {
        isr.on_interrupt();
    }
}

//! Polled port tests

mod common;

use common::{MockUart, UNLIMITED};
use uart_ring::{IrqFlags, SerialConfig, SerialError, SerialWrite, Unbuffered};

#[test]
fn test_read_times_out_when_idle() {
    let mut port = Unbuffered::new(MockUart::new(), SerialConfig::default())
        .unwrap()
        .with_retry_budget(10);

    assert_eq!(port.get_byte(), Err(SerialError::Timeout));
    assert_eq!(port.hardware().reads(), 0);
}

#[test]
fn test_read_returns_waiting_byte() {
    let mut port = Unbuffered::new(MockUart::new(), SerialConfig::default()).unwrap();

    port.hardware().feed(b"ok");
    assert_eq!(port.get_byte(), Ok(b'o'));
    assert_eq!(port.get_byte(), Ok(b'k'));
}

#[test]
fn test_write_goes_straight_to_hardware() {
    let mut port = Unbuffered::new(MockUart::new().with_tx_room(UNLIMITED), SerialConfig::default()).unwrap();

    port.write_line("hi");
    assert_eq!(port.hardware().sent(), b"hi\r\n");
}

#[test]
fn test_no_interrupts_enabled() {
    let port = Unbuffered::new(MockUart::new(), SerialConfig::default()).unwrap();
    let hw = port.release();
    assert!(!hw.irq_enabled(IrqFlags::RX));
    assert!(!hw.irq_enabled(IrqFlags::TX));
    assert!(hw.configured().is_some());
}

#[test]
fn test_configure_failure() {
    let result = Unbuffered::new(MockUart::failing(), SerialConfig::default());
    assert!(matches!(result, Err(SerialError::Hardware)));
}

//! serial-echo firmware
//!
//! Line echo console on UART1 with RTS flow control:
//! 1. Initialize UART driver and RTS pin
//! 2. Start the interrupt service task (high priority)
//! 3. Main loop: read a line, echo it, drain the diagnostic log

#![no_std]
#![no_main]

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::fmt::Write;

use esp_idf_svc::hal::gpio::{AnyIOPin, OutputPin, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::sys as esp_idf_sys;
use esp_idf_svc::sys::EspError;

use uart_ring::ascii::EOL;
use uart_ring::config::LINE_BUFFER_SIZE;
use uart_ring::hal::esp32::EspUart;
use uart_ring::log_drain::drain_log;
use uart_ring::{
    rt_error, rt_info, FlowControl, IrqFlags, Serial, SerialConfig, SerialError, SerialIsr,
    SerialPort, SerialWrite, SERIAL_LOG,
};

/// GPIO used as RTS output.
const RTS_PIN: u8 = 4;
const ISR_TASK_PRIORITY: u32 = 20;
const ISR_TASK_STACK: u32 = 4096;

type EchoSerial = Serial<EspUart<'static>>;
type EchoIsr = SerialIsr<'static, EspUart<'static>>;

// Wrapper to make UnsafeCell Sync for statics initialised once in main.
// SAFETY: written once before the service task starts, then only the owning
// context touches it.
#[repr(transparent)]
struct SyncCell<T>(UnsafeCell<Option<T>>);
unsafe impl<T> Sync for SyncCell<T> {}

impl<T> SyncCell<T> {
    const fn new() -> Self {
        Self(UnsafeCell::new(None))
    }
}

static SERIAL: SyncCell<EchoSerial> = SyncCell::new();
static ISR: SyncCell<EchoIsr> = SyncCell::new();

fn timestamp_us() -> i64 {
    unsafe { esp_idf_sys::esp_timer_get_time() }
}

fn esp_failed(e: EspError) -> SerialError {
    rt_error!(SERIAL_LOG, timestamp_us(), "esp-idf: {:?}", e);
    SerialError::Hardware
}

/// Bring up the UART and hand out the two handles.
fn init() -> Result<SerialPort<'static, EspUart<'static>>, SerialError> {
    let peripherals = Peripherals::take().map_err(esp_failed)?;
    let pins = peripherals.pins;

    let driver = UartDriver::new(
        peripherals.uart1,
        pins.gpio17,
        pins.gpio18,
        Option::<AnyIOPin>::None, // CTS
        Option::<AnyIOPin>::None, // RTS (driven as GPIO below)
        &uart::config::Config::default(),
    )
    .map_err(esp_failed)?;
    let rts = PinDriver::output(pins.gpio4.downgrade_output()).map_err(esp_failed)?;

    let config = SerialConfig::default().with_flow_control(FlowControl::Rts {
        port: 0,
        pin: RTS_PIN,
    });
    let serial = Serial::new(EspUart::new(driver, Some(rts)), config)?;

    // SAFETY: single initialisation before the service task exists.
    let serial: &'static mut EchoSerial = unsafe {
        let slot = &mut *SERIAL.0.get();
        slot.insert(serial)
    };
    let (port, isr) = serial.split();
    unsafe {
        *ISR.0.get() = Some(isr);
    }

    Ok(port)
}

/// Interrupt service task.
///
/// Stands in for the UART vector: runs the handler until no receive source
/// is pending, then yields for a tick.
unsafe extern "C" fn isr_task(_arg: *mut c_void) {
    let Some(isr) = (*ISR.0.get()).as_mut() else {
        esp_idf_sys::vTaskDelete(core::ptr::null_mut());
        return;
    };

    loop {
        let pending = isr.on_interrupt();
        if !pending.intersects(IrqFlags::RX_ANY) {
            esp_idf_sys::vTaskDelay(1);
        }
    }
}

#[no_mangle]
fn main() {
    // Initialize ESP-IDF
    esp_idf_sys::link_patches();

    let mut port = match init() {
        Ok(port) => port,
        Err(e) => {
            rt_error!(SERIAL_LOG, timestamp_us(), "init failed: {} ({})", e, e.code());
            loop {
                unsafe {
                    esp_idf_sys::vTaskDelay(1000);
                }
            }
        }
    };

    unsafe {
        esp_idf_sys::xTaskCreatePinnedToCore(
            Some(isr_task),
            c"serial-isr".as_ptr(),
            ISR_TASK_STACK,
            core::ptr::null_mut(),
            ISR_TASK_PRIORITY,
            core::ptr::null_mut(),
            0,
        );
    }

    rt_info!(SERIAL_LOG, timestamp_us(), "{} ready", env!("VERSION_STRING"));
    drain_log(&mut port, &SERIAL_LOG);

    let mut line = [0u8; LINE_BUFFER_SIZE];
    loop {
        port.write_bytes(b"> ");
        let len = match port.read_line() {
            Some(text) => {
                line[..text.len()].copy_from_slice(text);
                text.len()
            }
            None => 0,
        };

        if &line[..len] == b"status" {
            let status = port.rx_status();
            let _ = write!(
                port,
                "overflow={} dropped={} filtered={} paused={} buffered={}\r\n",
                status.overflow,
                status.overflow_count,
                status.filtered_count,
                status.flow_paused,
                status.buffered
            );
        } else {
            port.write_bytes(&line[..len]);
            port.write_bytes(EOL.as_bytes());
        }

        drain_log(&mut port, &SERIAL_LOG);
    }
}

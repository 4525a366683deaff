//! Control bytes understood by the transport.

/// Resume transmission (software flow control, reserved)
pub const XON: u8 = 0x11;
/// Pause transmission (software flow control, reserved)
pub const XOFF: u8 = 0x13;
/// End of transmission
pub const EOT: u8 = 0x04;
/// Backspace
pub const BS: u8 = 0x08;
pub const LF: u8 = 0x0A;
pub const CR: u8 = 0x0D;
/// Cancel; also the sentinel delivered after `rx_cancel`
pub const CAN: u8 = 0x18;
/// Ctrl-Z, end of file
pub const EOF: u8 = 0x1A;
/// Delete
pub const DEL: u8 = 0x7F;

/// Line terminator appended by `write_line`.
pub const EOL: &str = "\r\n";

//! Serial port interface for UART 16550 communication.
//! Provides thread-safe access to write formatted text to a serial port.

use core::fmt::{self, Write};

use crate::{apic::handlers::DiagnosticSink, constants::ports::SERIAL_PORT};
use lazy_static::lazy_static;
use spin::Mutex;
use uart_16550::SerialPort;

lazy_static! {
    /// Thread-safe wrapper around the first serial port (COM1).
    /// Initializes the port on first access.
    pub static ref SERIAL1: Mutex<SerialPort> = {
        let mut serial_port = unsafe { SerialPort::new(SERIAL_PORT) };
        serial_port.init();
        Mutex::new(serial_port)
    };
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    SERIAL1
        .lock()
        .write_fmt(args)
        .expect("Printing to serial failed");
}

/// Diagnostic lines from interrupt handlers.
///
/// Never spins on the port lock: if the interrupted code holds it, the line is
/// dropped.
pub struct SerialSink;

impl DiagnosticSink for SerialSink {
    fn emit(&self, line: fmt::Arguments) {
        if let Some(mut serial) = SERIAL1.try_lock() {
            // a failed write loses the line, same as a busy port
            serial.write_fmt(format_args!("{}\n", line)).ok();
        }
    }
}

/// Prints formatted text to the serial port.
///
/// # Examples
/// ```
/// serial_print!("Hello {}", "World");
/// ```
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*))
    };
}

/// Prints formatted text to the serial port, followed by a newline.
///
/// # Examples
/// ```
/// serial_println!("Hello {}", "World");
/// ```
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)));
}

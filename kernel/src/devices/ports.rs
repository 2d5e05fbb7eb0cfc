//! Byte-wide port I/O.

use x86_64::instructions::port::Port;

/// Raw byte access to numbered I/O ports.
pub trait PortIo {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
}

/// `in`/`out` instructions on the current CPU.
pub struct X86Ports {
    _private: (),
}

impl X86Ports {
    /// # Safety
    /// The caller must own every port it touches through this handle; writes to
    /// arbitrary ports can reprogram any device on the platform.
    pub const unsafe fn new() -> Self {
        X86Ports { _private: () }
    }
}

impl PortIo for X86Ports {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        unsafe { Port::<u8>::new(port).read() }
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        unsafe { Port::<u8>::new(port).write(value) }
    }
}

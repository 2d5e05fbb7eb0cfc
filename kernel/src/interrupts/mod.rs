//! Interrupt vector dispatch.
//!
//! Handlers are installed by entry-point address under a vector number. The kernel
//! implementation is [`idt::IdtDispatch`]; tests substitute a recording fake.

use x86_64::VirtAddr;

pub mod idt;

/// Address of an interrupt entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlerEntry(VirtAddr);

impl HandlerEntry {
    pub const fn from_addr(addr: VirtAddr) -> Self {
        HandlerEntry(addr)
    }

    pub const fn addr(self) -> VirtAddr {
        self.0
    }
}

/// Maps a vector number to an interrupt entry point.
pub trait InterruptDispatch {
    fn register(&mut self, vector: u8, entry: HandlerEntry);
}

/// Loads the IDT on the current CPU.
pub fn init() {
    idt::init_idt();
}

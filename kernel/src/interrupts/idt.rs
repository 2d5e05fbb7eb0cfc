//! Interrupt Descriptor Table setup
//!
//! This module provides:
//! - The IDT, populated at runtime through [`IdtDispatch`]
//! - A function to enable interrupts

use lazy_static::lazy_static;
use spin::Mutex;
use x86_64::{instructions::interrupts, structures::idt::InterruptDescriptorTable};

use super::{HandlerEntry, InterruptDispatch};

lazy_static! {
    /// The system's Interrupt Descriptor Table.
    /// Lives for the whole kernel lifetime, so the CPU may keep reading it after
    /// the lock is released.
    static ref IDT: Mutex<InterruptDescriptorTable> = Mutex::new(InterruptDescriptorTable::new());
}

/// Loads the IDT on the current CPU.
pub fn init_idt() {
    let idt = IDT.lock();
    unsafe {
        idt.load_unsafe();
    }
}

/// Enables interrupts on the current CPU.
pub fn enable() {
    interrupts::enable();
}

/// Installs handlers directly into the loaded IDT.
pub struct IdtDispatch {
    _private: (),
}

impl IdtDispatch {
    /// # Safety
    /// Every entry registered through the returned value must be the address of an
    /// `extern "x86-interrupt"` function.
    pub const unsafe fn new() -> Self {
        IdtDispatch { _private: () }
    }
}

impl InterruptDispatch for IdtDispatch {
    fn register(&mut self, vector: u8, entry: HandlerEntry) {
        let mut idt = IDT.lock();
        unsafe {
            idt[vector].set_handler_addr(entry.addr());
        }
    }
}

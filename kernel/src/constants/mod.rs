//! System-wide constants and hardware-specific values.

pub mod apic;
pub mod idt;
pub mod ports;

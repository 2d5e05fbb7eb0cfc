//! Interrupt Descriptor Table configuration.

/// Vector number assigned to the local APIC timer interrupt.
pub const APIC_TIMER_VECTOR: u8 = 0x40;

/// Vector number the local APIC delivers spurious interrupts on.
pub const SPURIOUS_VECTOR: u8 = 0xFF;

/// First vector past the CPU exceptions (0x00..0x20) and the remapped
/// legacy PIC lines (0x20..0x30).
pub const FIRST_FREE_VECTOR: u8 = 0x30;

const _: () = assert!(APIC_TIMER_VECTOR != SPURIOUS_VECTOR);
const _: () = assert!(APIC_TIMER_VECTOR >= FIRST_FREE_VECTOR);
const _: () = assert!(SPURIOUS_VECTOR >= FIRST_FREE_VECTOR);

//! Local APIC configuration constants.

/// Physical address of the local APIC register block.
/// Identity mapped, so this is also the virtual address registers are accessed at.
pub const APIC_BASE_ADDR: u64 = 0xFEE0_0000;

/// APIC timer frequency in Hertz.
/// Determines how often timer interrupts occur.
pub const APIC_TIMER_FREQUENCY: u32 = 1000;

/// `IA32_APIC_BASE` model-specific register.
pub const APIC_BASE_MSR: u32 = 0x1B;

/// Global enable bit of `IA32_APIC_BASE`.
pub const APIC_BASE_ENABLE: u64 = 1 << 11;

/// Base address field of `IA32_APIC_BASE` (bits 12..=51).
pub const APIC_BASE_ADDR_MASK: u64 = 0x000F_FFFF_FFFF_F000;

/// Software enable bit of the spurious-interrupt vector register.
pub const APIC_SOFTWARE_ENABLE: u32 = 1 << 8;

/// LVT mask bit.
pub const APIC_LVT_MASKED: u32 = 1 << 16;

/// LVT timer periodic-mode bit.
pub const APIC_LVT_TIMER_PERIODIC: u32 = 1 << 17;

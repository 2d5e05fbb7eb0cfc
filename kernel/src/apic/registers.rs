//! Typed access to the local APIC register block.
//!
//! Only the registers this driver programs are enumerated, so every access lands on a
//! known offset inside the single mapped page.

use crate::constants::apic::{APIC_LVT_MASKED, APIC_LVT_TIMER_PERIODIC};

/// Registers of the local APIC block, by offset from the base address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ApicRegister {
    EndOfInterrupt = 0x0B0,
    SpuriousVector = 0x0F0,
    LvtTimer = 0x320,
    TimerInitialCount = 0x380,
    TimerCurrentCount = 0x390,
    TimerDivideConfig = 0x3E0,
}

impl ApicRegister {
    pub const ALL: [ApicRegister; 6] = [
        ApicRegister::EndOfInterrupt,
        ApicRegister::SpuriousVector,
        ApicRegister::LvtTimer,
        ApicRegister::TimerInitialCount,
        ApicRegister::TimerCurrentCount,
        ApicRegister::TimerDivideConfig,
    ];

    /// Byte offset from the base of the register block.
    pub const fn offset(self) -> u32 {
        self as u32
    }

    /// Position of the register in [`ApicRegister::ALL`].
    pub const fn index(self) -> usize {
        match self {
            ApicRegister::EndOfInterrupt => 0,
            ApicRegister::SpuriousVector => 1,
            ApicRegister::LvtTimer => 2,
            ApicRegister::TimerInitialCount => 3,
            ApicRegister::TimerCurrentCount => 4,
            ApicRegister::TimerDivideConfig => 5,
        }
    }
}

/// 32-bit register access over a mapped APIC block.
///
/// Implementations must perform every access in program order; the hardware
/// implementation is volatile MMIO.
pub trait RegisterBlock {
    fn read(&self, reg: ApicRegister) -> u32;
    fn write(&self, reg: ApicRegister, value: u32);
}

/// Memory-mapped register block at a fixed virtual address.
#[derive(Debug)]
pub struct Mmio {
    base: u64,
}

impl Mmio {
    /// Creates an accessor for the block at `base`.
    ///
    /// # Safety
    /// No register may be touched until `base` is mapped writable and uncached.
    /// Construction alone performs no access.
    pub const unsafe fn new(base: u64) -> Self {
        Mmio { base }
    }

    fn ptr(&self, reg: ApicRegister) -> *mut u32 {
        (self.base + reg.offset() as u64) as *mut u32
    }
}

impl RegisterBlock for Mmio {
    #[inline]
    fn read(&self, reg: ApicRegister) -> u32 {
        unsafe { core::ptr::read_volatile(self.ptr(reg)) }
    }

    #[inline]
    fn write(&self, reg: ApicRegister, value: u32) {
        unsafe { core::ptr::write_volatile(self.ptr(reg), value) }
    }
}

/// Timer divide configuration values (Intel SDM vol. 3, 11.5.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TimerDivide {
    Div1 = 0b1011,
    Div2 = 0b0000,
    Div4 = 0b0001,
    Div8 = 0b0010,
    Div16 = 0b0011,
    Div32 = 0b1000,
    Div64 = 0b1001,
    Div128 = 0b1010,
}

impl TimerDivide {
    pub const fn bits(self) -> u32 {
        self as u32
    }

    pub const fn divisor(self) -> u32 {
        match self {
            TimerDivide::Div1 => 1,
            TimerDivide::Div2 => 2,
            TimerDivide::Div4 => 4,
            TimerDivide::Div8 => 8,
            TimerDivide::Div16 => 16,
            TimerDivide::Div32 => 32,
            TimerDivide::Div64 => 64,
            TimerDivide::Div128 => 128,
        }
    }
}

/// Value of the LVT timer entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LvtTimer {
    pub vector: u8,
    pub periodic: bool,
    pub masked: bool,
}

impl LvtTimer {
    /// Unmasked one-shot entry.
    pub const fn one_shot(vector: u8) -> Self {
        LvtTimer {
            vector,
            periodic: false,
            masked: false,
        }
    }

    /// Unmasked periodic entry.
    pub const fn periodic(vector: u8) -> Self {
        LvtTimer {
            vector,
            periodic: true,
            masked: false,
        }
    }

    pub const fn bits(self) -> u32 {
        let mut bits = self.vector as u32;
        if self.periodic {
            bits |= APIC_LVT_TIMER_PERIODIC;
        }
        if self.masked {
            bits |= APIC_LVT_MASKED;
        }
        bits
    }

    pub const fn from_bits(bits: u32) -> Self {
        LvtTimer {
            vector: bits as u8,
            periodic: bits & APIC_LVT_TIMER_PERIODIC != 0,
            masked: bits & APIC_LVT_MASKED != 0,
        }
    }
}

//! Turning the local APIC on: MSR enable, register block mapping, spurious vector.

use x86_64::{
    registers::model_specific::Msr, structures::paging::PageTableFlags, PhysAddr, VirtAddr,
};

use super::{ApicError, LocalApic};
use crate::{
    apic::registers::{ApicRegister, RegisterBlock},
    constants::apic::{
        APIC_BASE_ADDR_MASK, APIC_BASE_ENABLE, APIC_BASE_MSR, APIC_SOFTWARE_ENABLE,
    },
    interrupts::{HandlerEntry, InterruptDispatch},
    memory::mmio::PageMap,
};

/// Per-processor model-specific register access.
pub trait ModelSpecific {
    fn read_msr(&mut self, index: u32) -> u64;
    fn write_msr(&mut self, index: u32, value: u64);
}

/// `rdmsr`/`wrmsr` on the current CPU.
pub struct X86Msrs {
    _private: (),
}

impl X86Msrs {
    /// # Safety
    /// Writing MSRs can change processor behaviour arbitrarily; callers must only
    /// write registers whose semantics they own.
    pub const unsafe fn new() -> Self {
        X86Msrs { _private: () }
    }
}

impl ModelSpecific for X86Msrs {
    fn read_msr(&mut self, index: u32) -> u64 {
        unsafe { Msr::new(index).read() }
    }

    fn write_msr(&mut self, index: u32, value: u64) {
        unsafe { Msr::new(index).write(value) }
    }
}

/// Page attributes for the register block: writable, cache disabled, write-through.
pub const MMIO_FLAGS: PageTableFlags = PageTableFlags::PRESENT
    .union(PageTableFlags::WRITABLE)
    .union(PageTableFlags::NO_CACHE)
    .union(PageTableFlags::WRITE_THROUGH);

impl<R: RegisterBlock> LocalApic<R> {
    /// Sets the global enable bit in `IA32_APIC_BASE`, relocating the block to the
    /// configured base. Other bits (BSP flag, x2APIC mode) are preserved.
    pub fn enable(&self, msrs: &mut impl ModelSpecific) {
        let current = msrs.read_msr(APIC_BASE_MSR);
        let firmware_base = current & APIC_BASE_ADDR_MASK;
        if firmware_base != self.config.base {
            log::debug!(
                "APIC base moved from {:#x} to {:#x}",
                firmware_base,
                self.config.base
            );
        }

        let value = (current & !APIC_BASE_ADDR_MASK) | self.config.base | APIC_BASE_ENABLE;
        msrs.write_msr(APIC_BASE_MSR, value);
    }

    /// Identity maps the register block as uncacheable MMIO.
    pub fn map(&self, mapper: &mut impl PageMap) -> Result<(), ApicError> {
        mapper.map(
            PhysAddr::new(self.config.base),
            VirtAddr::new(self.config.base),
            MMIO_FLAGS,
        )
    }

    /// Installs the spurious handler, then software-enables the APIC with the
    /// spurious vector. From here on unclaimed interrupts land in `entry`.
    pub fn install_spurious(&self, dispatch: &mut impl InterruptDispatch, entry: HandlerEntry) {
        dispatch.register(self.config.spurious_vector, entry);
        self.regs.write(
            ApicRegister::SpuriousVector,
            APIC_SOFTWARE_ENABLE | self.config.spurious_vector as u32,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apic::{
        sim::{Event, Sim},
        ApicConfig,
    };
    use crate::constants::apic::APIC_BASE_ADDR;

    #[test]
    fn test_enable_sets_bit_and_keeps_bsp_flag() {
        let sim = Sim::new();
        let mut msrs = sim.msrs();
        msrs.set(APIC_BASE_MSR, 0xFEE0_0100);
        let apic = LocalApic::new(sim.registers(), ApicConfig::DEFAULT);

        apic.enable(&mut msrs);

        assert_eq!(msrs.get(APIC_BASE_MSR), 0xFEE0_0900);
    }

    #[test]
    fn test_enable_relocates_to_configured_base() {
        let sim = Sim::new();
        let mut msrs = sim.msrs();
        msrs.set(APIC_BASE_MSR, 0xFED0_0100);
        let apic = LocalApic::new(sim.registers(), ApicConfig::DEFAULT);

        apic.enable(&mut msrs);

        let value = msrs.get(APIC_BASE_MSR);
        assert_eq!(value & APIC_BASE_ADDR_MASK, APIC_BASE_ADDR);
        assert_ne!(value & APIC_BASE_ENABLE, 0);
        assert_ne!(value & 0x100, 0);
    }

    #[test]
    fn test_map_is_identity_and_uncached() {
        let sim = Sim::new();
        let mut mapper = sim.mapper();
        let apic = LocalApic::new(sim.registers(), ApicConfig::DEFAULT);

        apic.map(&mut mapper).unwrap();

        assert_eq!(
            sim.events(),
            vec![Event::Map {
                phys: APIC_BASE_ADDR,
                virt: APIC_BASE_ADDR,
                flags: MMIO_FLAGS,
            }]
        );
        assert!(MMIO_FLAGS.contains(PageTableFlags::NO_CACHE | PageTableFlags::WRITE_THROUGH));
        assert!(MMIO_FLAGS.contains(PageTableFlags::WRITABLE));
    }

    #[test]
    fn test_map_failure_propagates() {
        let sim = Sim::new();
        let mut mapper = sim.mapper();
        mapper.fail();
        let apic = LocalApic::new(sim.registers(), ApicConfig::DEFAULT);

        assert!(matches!(apic.map(&mut mapper), Err(ApicError::MapFailed)));
    }

    #[test]
    fn test_install_spurious_registers_then_enables() {
        let sim = Sim::new();
        let mut dispatch = sim.dispatch();
        let apic = LocalApic::new(sim.registers(), ApicConfig::DEFAULT);
        let entry = HandlerEntry::from_addr(VirtAddr::new(0x1000));

        apic.install_spurious(&mut dispatch, entry);

        assert_eq!(
            sim.events(),
            vec![
                Event::Register(0xFF, entry),
                Event::Reg(ApicRegister::SpuriousVector, 0x1FF),
            ]
        );
    }
}

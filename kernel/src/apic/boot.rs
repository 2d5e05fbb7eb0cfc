//! Kernel wiring: the single APIC instance, its interrupt entry points and `init`.

use raw_cpuid::CpuId;
use x86_64::{structures::idt::InterruptStackFrame, VirtAddr};

use super::{
    bring_up, enable::X86Msrs, handlers::TickCounter, registers::Mmio, ApicConfig, BootHardware,
    HandlerEntries, LocalApic,
};
use crate::{
    constants::apic::APIC_BASE_ADDR,
    devices::{ports::X86Ports, serial::SerialSink},
    interrupts::{idt::IdtDispatch, HandlerEntry},
    memory::{frame_allocator::FRAME_ALLOCATOR, mmio::KernelMapper, MAPPER},
};

/// Registers are only touched after `init` has mapped `APIC_BASE_ADDR`.
static LOCAL_APIC: LocalApic<Mmio> =
    LocalApic::new(unsafe { Mmio::new(APIC_BASE_ADDR) }, ApicConfig::DEFAULT);

static TICKS: TickCounter = TickCounter::new();

extern "x86-interrupt" fn spurious_entry(_: InterruptStackFrame) {
    LOCAL_APIC.handle_spurious(&SerialSink);
}

extern "x86-interrupt" fn timer_entry(_: InterruptStackFrame) {
    LOCAL_APIC.handle_timer(&TICKS, &SerialSink);
}

/// Enables the local APIC and starts its timer at `APIC_TIMER_FREQUENCY`.
///
/// Requires the IDT to be loaded and the frame allocator to be set up. Interrupts
/// should still be disabled. Hangs if the PIT does not work.
pub fn init() {
    let has_apic = CpuId::new()
        .get_feature_info()
        .is_some_and(|features| features.has_apic());
    assert!(has_apic, "CPU has no local APIC");

    let entries = HandlerEntries {
        spurious: HandlerEntry::from_addr(VirtAddr::new(spurious_entry as usize as u64)),
        timer: HandlerEntry::from_addr(VirtAddr::new(timer_entry as usize as u64)),
    };

    let mut mapper = MAPPER.lock();
    let mut allocator = FRAME_ALLOCATOR.lock();
    let allocator = allocator.as_mut().expect("Frame allocator not initialized");

    let mut hw = unsafe {
        BootHardware {
            msrs: X86Msrs::new(),
            mapper: KernelMapper::new(&mut *mapper, allocator),
            dispatch: IdtDispatch::new(),
            ports: X86Ports::new(),
        }
    };

    bring_up(&LOCAL_APIC, &mut hw, entries).expect("Failed to configure local APIC");
}

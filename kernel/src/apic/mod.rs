//! Local APIC bring-up and PIT-calibrated periodic timer.
//!
//! Boot order is fixed: enable through `IA32_APIC_BASE`, map the register block,
//! install the spurious handler, then calibrate the timer. There is no recovery if a
//! step fails; calibration spins forever if the PIT never signals.

use crate::{
    constants::{
        apic::{APIC_BASE_ADDR, APIC_TIMER_FREQUENCY},
        idt::{APIC_TIMER_VECTOR, SPURIOUS_VECTOR},
    },
    devices::ports::PortIo,
    interrupts::{HandlerEntry, InterruptDispatch},
    memory::mmio::PageMap,
};

pub mod calibration;
pub mod enable;
pub mod handlers;
pub mod registers;

#[cfg(feature = "kernel")]
mod boot;
#[cfg(test)]
pub(crate) mod sim;

#[cfg(feature = "kernel")]
pub use boot::init;

use calibration::{Calibration, TargetFrequency, CALIBRATION_WINDOW_MS};
use enable::ModelSpecific;
use registers::{ApicRegister, RegisterBlock, TimerDivide};

#[derive(Debug)]
pub enum ApicError {
    ZeroFrequency,
    MapFailed,
    /// The timer counted too few ticks for a non-zero period at the target frequency.
    CalibrationFailed,
}

/// Fixed configuration of the local APIC.
#[derive(Clone, Copy, Debug)]
pub struct ApicConfig {
    /// Physical base of the register block, identity mapped.
    pub base: u64,
    pub spurious_vector: u8,
    pub timer_vector: u8,
    pub frequency: TargetFrequency,
    pub divide: TimerDivide,
}

impl ApicConfig {
    pub const DEFAULT: ApicConfig = ApicConfig {
        base: APIC_BASE_ADDR,
        spurious_vector: SPURIOUS_VECTOR,
        timer_vector: APIC_TIMER_VECTOR,
        frequency: TargetFrequency::new(APIC_TIMER_FREQUENCY),
        divide: TimerDivide::Div1,
    };
}

/// Register access bundled with the vectors and timer settings it is programmed with.
pub struct LocalApic<R> {
    regs: R,
    config: ApicConfig,
}

impl<R: RegisterBlock> LocalApic<R> {
    pub const fn new(regs: R, config: ApicConfig) -> Self {
        LocalApic { regs, config }
    }

    pub fn config(&self) -> &ApicConfig {
        &self.config
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Signal end-of-interrupt
    #[inline(always)]
    pub fn end_of_interrupt(&self) {
        self.regs.write(ApicRegister::EndOfInterrupt, 0);
    }
}

/// Interrupt entry points installed during bring-up.
#[derive(Clone, Copy, Debug)]
pub struct HandlerEntries {
    pub spurious: HandlerEntry,
    pub timer: HandlerEntry,
}

/// Platform services bring-up consumes.
pub struct BootHardware<M, P, D, I> {
    pub msrs: M,
    pub mapper: P,
    pub dispatch: D,
    pub ports: I,
}

/// Runs the full bring-up sequence on the current CPU.
///
/// Returns only once the timer is running periodically. Must not be called twice.
pub fn bring_up<R, M, P, D, I>(
    apic: &LocalApic<R>,
    hw: &mut BootHardware<M, P, D, I>,
    entries: HandlerEntries,
) -> Result<Calibration, ApicError>
where
    R: RegisterBlock,
    M: ModelSpecific,
    P: PageMap,
    D: InterruptDispatch,
    I: PortIo,
{
    apic.enable(&mut hw.msrs);
    apic.map(&mut hw.mapper)?;
    log::debug!("APIC registers mapped at {:#x}", apic.config.base);

    apic.install_spurious(&mut hw.dispatch, entries.spurious);
    log::debug!(
        "Spurious vector {:#x} installed",
        apic.config.spurious_vector
    );

    let calibration = apic.calibrate_timer(&mut hw.dispatch, &mut hw.ports, entries.timer)?;
    log::info!(
        "APIC timer: {} ticks per {} ms, reload {} for {} Hz",
        calibration.ticks_elapsed,
        CALIBRATION_WINDOW_MS,
        calibration.initial_count,
        apic.config.frequency.hz()
    );

    Ok(calibration)
}

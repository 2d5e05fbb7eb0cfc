//! APIC timer calibration against the PIT.
//!
//! The APIC timer runs off the bus clock, whose rate is not known up front. We let
//! it count down freely from `u32::MAX` for one PIT-timed window, then scale the
//! observed tick delta to the period of the target frequency.

use core::num::NonZeroU32;

use super::{ApicError, LocalApic};
use crate::{
    apic::registers::{ApicRegister, LvtTimer, RegisterBlock},
    devices::{
        pit::{self, Pit},
        ports::PortIo,
    },
    interrupts::{HandlerEntry, InterruptDispatch},
};

/// Length of the PIT reference window.
pub const CALIBRATION_WINDOW_MS: u32 = 10;

/// Reference windows per second; the factor that turns a per-window tick count
/// into a per-second rate.
pub const CALIBRATION_WINDOWS_PER_SECOND: u32 = 1000 / CALIBRATION_WINDOW_MS;

/// PIT channel 2 reload value for one reference window.
pub const PIT_CALIBRATION_DIVISOR: u16 = pit::divisor_for(CALIBRATION_WINDOWS_PER_SECOND);

/// Start value of the free-running countdown.
pub const FREE_RUN_COUNT: u32 = u32::MAX;

const _: () = assert!(1000 % CALIBRATION_WINDOW_MS == 0);

/// Timer interrupt rate in Hertz. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetFrequency(NonZeroU32);

impl TargetFrequency {
    /// Panics on zero; in a `const` context that is a build error.
    pub const fn new(hz: u32) -> Self {
        match NonZeroU32::new(hz) {
            Some(hz) => TargetFrequency(hz),
            None => panic!("timer frequency must be non-zero"),
        }
    }

    pub const fn hz(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for TargetFrequency {
    type Error = ApicError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        NonZeroU32::new(hz)
            .map(TargetFrequency)
            .ok_or(ApicError::ZeroFrequency)
    }
}

/// Outcome of a calibration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calibration {
    /// APIC ticks counted during one reference window.
    pub ticks_elapsed: u32,
    /// Periodic reload value programmed into the timer.
    pub initial_count: u32,
}

/// Ticks counted down from [`FREE_RUN_COUNT`] to `current`.
pub const fn ticks_elapsed(current: u32) -> u32 {
    FREE_RUN_COUNT - current
}

/// Periodic reload value giving `frequency` interrupts per second when
/// `ticks_elapsed` ticks were counted in one reference window.
///
/// Truncates, so the real rate is at or slightly above the target. Counts above
/// `u32::MAX` saturate. Returns `None` when the period rounds down to zero ticks:
/// the timer cannot run that fast.
pub fn initial_count(ticks_elapsed: u32, frequency: TargetFrequency) -> Option<u32> {
    match scaled_count(ticks_elapsed, frequency) {
        0 => None,
        count => Some(count.min(u32::MAX as u64) as u32),
    }
}

fn scaled_count(ticks_elapsed: u32, frequency: TargetFrequency) -> u64 {
    ticks_elapsed as u64 * CALIBRATION_WINDOWS_PER_SECOND as u64 / frequency.hz() as u64
}

impl<R: RegisterBlock> LocalApic<R> {
    /// Measures the timer against the PIT and leaves it running periodically at the
    /// configured frequency.
    ///
    /// Blocks until the PIT window elapses, with no timeout. If the measurement is
    /// too small to give a non-zero period, the timer LVT is left masked and
    /// [`ApicError::CalibrationFailed`] is returned.
    pub fn calibrate_timer(
        &self,
        dispatch: &mut impl InterruptDispatch,
        ports: &mut impl PortIo,
        entry: HandlerEntry,
    ) -> Result<Calibration, ApicError> {
        let vector = self.config.timer_vector;

        dispatch.register(vector, entry);
        self.regs.write(ApicRegister::LvtTimer, LvtTimer::one_shot(vector).bits());
        self.regs.write(ApicRegister::TimerDivideConfig, self.config.divide.bits());

        let mut pit = Pit::new(ports);
        pit.arm();
        // both clocks start back to back
        self.regs.write(ApicRegister::TimerInitialCount, FREE_RUN_COUNT);
        pit.load(PIT_CALIBRATION_DIVISOR);
        pit.wait_elapsed();

        let ticks_elapsed = ticks_elapsed(self.regs.read(ApicRegister::TimerCurrentCount));

        let Some(initial_count) = initial_count(ticks_elapsed, self.config.frequency) else {
            let masked = LvtTimer {
                masked: true,
                ..LvtTimer::one_shot(vector)
            };
            self.regs.write(ApicRegister::LvtTimer, masked.bits());
            pit.disarm();
            log::error!(
                "APIC timer counted {} ticks in {} ms, too few for {} Hz",
                ticks_elapsed,
                CALIBRATION_WINDOW_MS,
                self.config.frequency.hz()
            );
            return Err(ApicError::CalibrationFailed);
        };

        self.regs.write(ApicRegister::LvtTimer, LvtTimer::periodic(vector).bits());
        self.regs.write(ApicRegister::TimerInitialCount, initial_count);

        pit.disarm();

        let raw = scaled_count(ticks_elapsed, self.config.frequency);
        if raw != initial_count as u64 {
            log::warn!(
                "APIC timer count {} out of range, saturated to {}",
                raw,
                initial_count
            );
        }

        Ok(Calibration {
            ticks_elapsed,
            initial_count,
        })
    }
}

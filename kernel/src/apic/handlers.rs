//! Bodies of the spurious and timer interrupt handlers.
//!
//! Both run in interrupt context: no allocation, no locks, and exactly one
//! end-of-interrupt write on every path.

use core::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use super::LocalApic;
use crate::apic::registers::RegisterBlock;

/// Line-oriented diagnostic output usable from interrupt context.
///
/// Implementations must not block; dropping a line is acceptable.
pub trait DiagnosticSink {
    fn emit(&self, line: fmt::Arguments);
}

/// Timer interrupts seen since boot. Never reset.
pub struct TickCounter {
    fired: AtomicU64,
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCounter {
    pub const fn new() -> Self {
        TickCounter {
            fired: AtomicU64::new(0),
        }
    }

    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Counts one tick and returns the new total.
    fn tick(&self) -> u64 {
        self.fired.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl<R: RegisterBlock> LocalApic<R> {
    pub fn handle_spurious(&self, sink: &impl DiagnosticSink) {
        sink.emit(format_args!("#SPURIOUS"));
        self.end_of_interrupt();
    }

    /// Emits one line per elapsed second at the configured rate.
    pub fn handle_timer(&self, ticks: &TickCounter, sink: &impl DiagnosticSink) {
        let fired = ticks.tick();
        let hz = self.config.frequency.hz() as u64;
        if fired % hz == 0 {
            sink.emit(format_args!("#TIMER ({} Hz, elapsed: {} s)", hz, fired / hz));
        }
        self.end_of_interrupt();
    }
}

//! 8254 PIT channel 2, used once as the reference clock for APIC timer calibration.

use crate::{
    constants::ports::{PIT_CHANNEL_2, PIT_MODE_CMD, SYSTEM_CONTROL_B},
    devices::ports::PortIo,
};

/// PIT oscillator frequency in Hertz.
pub const PIT_FREQUENCY: u32 = 1_193_182;

/// Channel 2, access mode lobyte/hibyte, mode 0 (interrupt on terminal count), binary.
const CHANNEL_2_ONE_SHOT: u8 = 0b1011_0000;

/// Port B bits kept across gate changes (parity/channel check enables).
const PORT_B_PRESERVE: u8 = 0x0C;
const PORT_B_GATE_2: u8 = 0x01;
const PORT_B_OUT_2: u8 = 0x20;

/// Divisor that makes channel 2 count down for `1 / per_second` seconds,
/// rounded to the nearest PIT tick.
pub const fn divisor_for(per_second: u32) -> u16 {
    let divisor = (PIT_FREQUENCY + per_second / 2) / per_second;
    assert!(divisor > 0 && divisor <= u16::MAX as u32);
    divisor as u16
}

pub struct Pit<'a, P: PortIo> {
    ports: &'a mut P,
}

impl<'a, P: PortIo> Pit<'a, P> {
    pub fn new(ports: &'a mut P) -> Self {
        Pit { ports }
    }

    /// Raises the channel 2 gate with the speaker off and selects one-shot mode.
    /// Counting starts once [`Pit::load`] writes the divisor.
    pub fn arm(&mut self) {
        let b = self.ports.read_u8(SYSTEM_CONTROL_B);
        self.ports
            .write_u8(SYSTEM_CONTROL_B, (b & PORT_B_PRESERVE) | PORT_B_GATE_2);
        self.ports.write_u8(PIT_MODE_CMD, CHANNEL_2_ONE_SHOT);
    }

    /// Writes the divisor, LSB first, which starts the countdown.
    pub fn load(&mut self, divisor: u16) {
        self.ports.write_u8(PIT_CHANNEL_2, (divisor & 0xFF) as u8);
        self.ports.write_u8(PIT_CHANNEL_2, (divisor >> 8) as u8);
    }

    pub fn has_elapsed(&mut self) -> bool {
        self.ports.read_u8(SYSTEM_CONTROL_B) & PORT_B_OUT_2 != 0
    }

    /// Spins until channel 2 reaches terminal count. There is no timeout: a PIT
    /// that never signals stalls the caller forever.
    pub fn wait_elapsed(&mut self) {
        while !self.has_elapsed() {
            core::hint::spin_loop();
        }
    }

    /// Drops the channel 2 gate and keeps the speaker off.
    pub fn disarm(&mut self) {
        let b = self.ports.read_u8(SYSTEM_CONTROL_B);
        self.ports.write_u8(SYSTEM_CONTROL_B, b & PORT_B_PRESERVE);
    }
}

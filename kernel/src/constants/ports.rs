//! I/O port definitions.

/// Base I/O port address for the first serial port (COM1).
pub const SERIAL_PORT: u16 = 0x3F8;

/// PIT channel 2 data port.
pub const PIT_CHANNEL_2: u16 = 0x42;

/// PIT mode/command port.
pub const PIT_MODE_CMD: u16 = 0x43;

/// System control port B: PIT channel 2 gate (bit 0), speaker (bit 1),
/// channel 2 output status (bit 5).
pub const SYSTEM_CONTROL_B: u16 = 0x61;

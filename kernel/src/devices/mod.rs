//! Device access.
//!
//! This module handles the devices the kernel drives directly:
//! - Serial port for log and diagnostic output
//! - Raw port I/O
//! - The PIT, as a calibration reference
pub mod pit;
pub mod ports;
pub mod serial;

//! Serial side of the logger
//!
//! This module provides:
//! - Opening the Teensy's USB serial port with fixed line settings
//! - Line-oriented reads bounded by the read timeout
//! - The [`TelemetryLink`] seam the logging loop reads from
//! - Port enumeration for `--list-ports`

pub mod link;
pub mod port;

pub use link::{LineBuffer, TelemetryLink};
pub use port::{PortConfig, SerialConnection};

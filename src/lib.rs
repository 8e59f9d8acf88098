//! Teensy telemetry logger
//!
//! Reads newline-delimited telemetry from a Teensy 4.1 over USB serial and
//! appends the data records to a timestamped CSV file.
//!
//! # Wire protocol
//!
//! - `#CONNECTED:<name>` from the device is answered with `#CMD:START\n`
//! - other `#` lines are control chatter and are ignored
//! - everything else is a CSV record, logged verbatim
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//! use teensy_logger::{LoggerConfig, Session, SerialLogger};
//!
//! # fn main() -> teensy_logger::Result<()> {
//! let config = LoggerConfig::default();
//! let session = Session::begin(&config)?;
//! let running = Arc::new(AtomicBool::new(true));
//! let mut logger = SerialLogger::open(&config, &session, running)?;
//! logger.run()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod record;
pub mod serial;
pub mod session;
pub mod signal;
pub mod sink;

pub use config::{InvalidUtf8Policy, LoggerConfig};
pub use error::{LoggerError, Result};
pub use logger::{LoopSettings, SerialLogger, SessionStats};
pub use serial::{SerialConnection, TelemetryLink};
pub use session::Session;
pub use sink::CsvSink;

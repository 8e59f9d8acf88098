//! Error types for the logger
//!
//! Everything below `main` returns [`LoggerError`]; the binary wraps it in
//! `anyhow` and turns it into an exit status.

use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;
use thiserror::Error;

/// Errors raised while setting up or running a logging session
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The serial device could not be opened
    #[error("Serial connection error on {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Fatal I/O fault on an open serial connection
    #[error("Serial connection error: {0}")]
    SerialIo(#[source] io::Error),

    /// A received line was not valid UTF-8 and the policy is `abort`
    #[error("Received a line that is not valid UTF-8: {0}")]
    Decode(#[source] Utf8Error),

    #[error("Failed to write log file {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create log directory {}: {source}", path.display())]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[source] io::Error),
}

impl LoggerError {
    /// True for failures of the serial link itself (open or runtime)
    pub fn is_connection(&self) -> bool {
        matches!(self, LoggerError::Connection { .. } | LoggerError::SerialIo(_))
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;

//! Logger configuration
//!
//! Defaults reproduce the fixed setup on the Pi Zero 2 (`/dev/ttyACM0` at
//! 115200 baud, logs under `/home/pi/teensy_logs`). A TOML file, environment
//! variables and CLI flags can override them, in that order.

use crate::error::{LoggerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Serial device the Teensy enumerates as
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Teensy USB serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Directory that receives the CSV files
pub const DEFAULT_LOG_DIR: &str = "/home/pi/teensy_logs";

/// Upper bound on waiting for a line terminator
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// The Teensy resets when the port opens
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// What to do with a line that is not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidUtf8Policy {
    /// Drop the line and log a warning
    #[default]
    Skip,
    /// Stop logging with an error
    Abort,
}

/// Resolved settings for one logging session
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    pub port: String,
    pub baud_rate: u32,
    pub log_dir: PathBuf,
    pub read_timeout: Duration,
    pub settle_delay: Duration,
    /// Reject data lines that are not 13 numeric fields
    pub strict: bool,
    pub on_invalid_utf8: InvalidUtf8Policy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            strict: false,
            on_invalid_utf8: InvalidUtf8Policy::Skip,
        }
    }
}

/// On-disk form of the config file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    port: Option<String>,
    baud_rate: Option<u32>,
    log_dir: Option<PathBuf>,
    read_timeout_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    strict: Option<bool>,
    on_invalid_utf8: Option<InvalidUtf8Policy>,
}

impl LoggerConfig {
    /// Load a TOML config file on top of the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| LoggerError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| LoggerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse TOML text on top of the defaults
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();

        if let Some(port) = file.port {
            config.port = port;
        }
        if let Some(baud_rate) = file.baud_rate {
            config.baud_rate = baud_rate;
        }
        if let Some(log_dir) = file.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(ms) = file.read_timeout_ms {
            config.read_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.settle_delay_ms {
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Some(strict) = file.strict {
            config.strict = strict;
        }
        if let Some(policy) = file.on_invalid_utf8 {
            config.on_invalid_utf8 = policy;
        }

        Ok(config)
    }

    /// Set the serial device path
    pub fn with_port(mut self, port: &str) -> Self {
        self.port = port.to_string();
        self
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the output directory
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    /// Set the line read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the post-open settle delay
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

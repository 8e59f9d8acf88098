//! Teensy Logger
//!
//! Logs PD-control telemetry from a Teensy 4.1 to CSV on a Raspberry Pi.
//!
//! # Usage
//!
//! ```bash
//! # Log with the built-in defaults (/dev/ttyACM0, 115200, /home/pi/teensy_logs)
//! teensy-logger
//!
//! # Different port and output directory
//! teensy-logger -p /dev/ttyACM1 -d ./logs
//!
//! # Settings from a TOML file, strict 13-field records
//! teensy-logger --config logger.toml --strict
//!
//! # Find the Teensy
//! teensy-logger --list-ports
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use teensy_logger::serial::port::print_ports;
use teensy_logger::{signal, InvalidUtf8Policy, LoggerConfig, SerialLogger, Session};

/// Teensy Logger
///
/// Copies telemetry lines from a Teensy serial port into a timestamped CSV file
#[derive(Parser)]
#[command(name = "teensy-logger")]
#[command(version)]
#[command(about = "Serial-to-CSV data logger for Teensy PD-control telemetry")]
struct Cli {
    /// TOML file with port, baud_rate, log_dir and other settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port path (e.g., /dev/ttyACM0)
    #[arg(short, long, env = "TEENSY_LOGGER_PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, env = "TEENSY_LOGGER_BAUD")]
    baud: Option<u32>,

    /// Directory for the CSV files
    #[arg(short = 'd', long, env = "TEENSY_LOGGER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Only log records with 13 numeric fields
    #[arg(long)]
    strict: bool,

    /// What to do with lines that are not valid UTF-8
    #[arg(long, value_enum)]
    on_invalid_utf8: Option<Utf8PolicyArg>,

    /// Delay after opening the port, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Line read timeout, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Command-line spelling of [`InvalidUtf8Policy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Utf8PolicyArg {
    /// Drop the line with a warning
    Skip,
    /// End the session with an error
    Abort,
}

impl From<Utf8PolicyArg> for InvalidUtf8Policy {
    fn from(arg: Utf8PolicyArg) -> Self {
        match arg {
            Utf8PolicyArg::Skip => InvalidUtf8Policy::Skip,
            Utf8PolicyArg::Abort => InvalidUtf8Policy::Abort,
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then env/CLI
    fn resolve_config(&self) -> Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::load(path)?,
            None => LoggerConfig::default(),
        };

        if let Some(ref port) = self.port {
            config = config.with_port(port);
        }
        if let Some(baud) = self.baud {
            config = config.with_baud_rate(baud);
        }
        if let Some(ref dir) = self.log_dir {
            config = config.with_log_dir(dir);
        }
        if let Some(ms) = self.settle_ms {
            config = config.with_settle_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_read_timeout(Duration::from_millis(ms));
        }
        if let Some(policy) = self.on_invalid_utf8 {
            config.on_invalid_utf8 = policy.into();
        }
        config.strict |= self.strict;

        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let result = if cli.list_ports {
        print_ports().context("Failed to enumerate serial ports")
    } else {
        cli.resolve_config().and_then(record)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run one logging session until Ctrl+C or a fatal error
fn record(config: LoggerConfig) -> Result<()> {
    let session = Session::begin(&config)?;

    println!("{}", "Data logger started".cyan().bold());
    println!("{}: {}", "Started".cyan(), session.started_label().white());
    println!("{}: {}", "Serial port".cyan(), session.port.white());
    println!("{}: {}", "Baud".cyan(), session.baud_rate.to_string().white());
    println!("{}: {}", "Log file".cyan(), session.log_path.display().to_string().white());

    let running = Arc::new(AtomicBool::new(true));
    signal::install(Arc::clone(&running))?;

    let outcome = match SerialLogger::open(&config, &session, running) {
        Ok(mut logger) => {
            let result = logger.run().map(|_| ());
            logger.print_summary();
            // Dropping the logger closes the serial port.
            result
        }
        Err(e) => Err(e),
    };

    if outcome.is_ok() {
        println!("\n{}", "Logging stopped".yellow());
    }

    if session.log_path.exists() {
        println!("Log file saved: {}", session.log_path.display().to_string().white());
    }

    outcome.with_context(|| format!("Logging session on {} failed", session.port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "teensy-logger",
            "-p",
            "/dev/ttyACM1",
            "--on-invalid-utf8",
            "abort",
            "--timeout-ms",
            "250",
            "--strict",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.port, "/dev/ttyACM1");
        assert_eq!(config.on_invalid_utf8, InvalidUtf8Policy::Abort);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert!(config.strict);
    }

    #[test]
    fn test_unknown_utf8_policy_rejected() {
        assert!(Cli::try_parse_from(["teensy-logger", "--on-invalid-utf8", "lossy"]).is_err());
    }
}

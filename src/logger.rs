//! Serial-to-CSV logging loop
//!
//! Provides:
//! - The `#CONNECTED:` / `#CMD:START` handshake with the Teensy
//! - Verbatim, flushed-per-line copying of data records into the CSV sink
//! - Periodic progress echo and an end-of-session summary

use crate::config::{InvalidUtf8Policy, LoggerConfig};
use crate::error::{LoggerError, Result};
use crate::record::{classify, validate_record, LineKind, START_COMMAND};
use crate::serial::{PortConfig, SerialConnection, TelemetryLink};
use crate::session::Session;
use crate::sink::CsvSink;
use colored::Colorize;
use log::{debug, info, warn};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Progress is echoed whenever the file offset lands on a multiple of this
pub const PROGRESS_INTERVAL_BYTES: u64 = 100;

/// Sleep between availability checks when the port is idle
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// True when a file offset should trigger a progress echo
pub fn is_progress_offset(position: u64) -> bool {
    position % PROGRESS_INTERVAL_BYTES == 0
}

/// Line counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub data_lines: u64,
    pub handshakes: u64,
    pub control_lines: u64,
    pub empty_lines: u64,
    pub rejected_lines: u64,
    pub invalid_utf8_lines: u64,
    pub progress_reports: u64,
}

/// Options that change how lines are handled inside the loop
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub strict: bool,
    pub on_invalid_utf8: InvalidUtf8Policy,
    pub idle_poll: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&LoggerConfig::default())
    }
}

impl From<&LoggerConfig> for LoopSettings {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            strict: config.strict,
            on_invalid_utf8: config.on_invalid_utf8,
            idle_poll: IDLE_POLL_INTERVAL,
        }
    }
}

/// Bridges one telemetry link to one CSV file
pub struct SerialLogger<L: TelemetryLink> {
    link: L,
    sink: CsvSink,
    settings: LoopSettings,
    running: Arc<AtomicBool>,
    stats: SessionStats,
}

impl SerialLogger<SerialConnection> {
    /// Open the serial port, wait for the device to settle, then create the
    /// log file with its header.
    ///
    /// The port is opened first so a missing device leaves no file behind.
    pub fn open(config: &LoggerConfig, session: &Session, running: Arc<AtomicBool>) -> Result<Self> {
        let port = PortConfig::new(&config.port)
            .with_baud_rate(config.baud_rate)
            .with_timeout(config.read_timeout);
        let connection = SerialConnection::open(port)?;

        println!(
            "{} Connected to {} at {} baud",
            "[OK]".green().bold(),
            config.port.white().bold(),
            config.baud_rate
        );

        debug!("Waiting {:?} for the device to settle", config.settle_delay);
        thread::sleep(config.settle_delay);

        let sink = CsvSink::create(&session.log_path)?;
        println!(
            "{} Logging to: {}",
            "[LOG]".cyan().bold(),
            session.log_path.display().to_string().white()
        );

        Ok(Self::new(connection, sink, LoopSettings::from(config), running))
    }
}

impl<L: TelemetryLink> SerialLogger<L> {
    pub fn new(link: L, sink: CsvSink, settings: LoopSettings, running: Arc<AtomicBool>) -> Self {
        Self {
            link,
            sink,
            settings,
            running,
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Give back the link, e.g. to inspect what was sent
    pub fn into_link(self) -> L {
        self.link
    }

    /// Copy lines until the running flag is cleared or the link fails
    pub fn run(&mut self) -> Result<&SessionStats> {
        println!("Receiving data... (Ctrl+C to stop)");

        while self.running.load(Ordering::SeqCst) {
            let available = match self.link.bytes_available() {
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LoggerError::SerialIo(e)),
            };

            if available == 0 {
                thread::sleep(self.settings.idle_poll);
                continue;
            }

            match self.link.read_line() {
                Ok(Some(raw)) => self.process_line(raw)?,
                Ok(None) => {}
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(LoggerError::SerialIo(e)),
            }
        }

        info!("Logging loop stopped after {} data lines", self.stats.data_lines);
        Ok(&self.stats)
    }

    /// Handle one raw line from the link
    fn process_line(&mut self, raw: Vec<u8>) -> Result<()> {
        let text = match String::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                return match self.settings.on_invalid_utf8 {
                    InvalidUtf8Policy::Skip => {
                        self.stats.invalid_utf8_lines += 1;
                        warn!(
                            "Skipping line with invalid UTF-8 ({} bytes): {}",
                            e.as_bytes().len(),
                            e.utf8_error()
                        );
                        Ok(())
                    }
                    InvalidUtf8Policy::Abort => Err(LoggerError::Decode(e.utf8_error())),
                };
            }
        };

        match classify(text.trim()) {
            LineKind::Connected(announcement) => {
                println!("{} Teensy connected: {}", "[OK]".green().bold(), announcement);
                self.link.send(START_COMMAND).map_err(LoggerError::SerialIo)?;
                self.stats.handshakes += 1;
            }
            LineKind::Control(line) => {
                debug!("Ignoring control line: {}", line);
                self.stats.control_lines += 1;
            }
            LineKind::Empty => {
                self.stats.empty_lines += 1;
            }
            LineKind::Data(line) => {
                if self.settings.strict {
                    if let Err(issue) = validate_record(line) {
                        warn!("Rejected record ({}): {}", issue, line);
                        self.stats.rejected_lines += 1;
                        return Ok(());
                    }
                }

                self.sink.append(line)?;
                self.stats.data_lines += 1;

                if is_progress_offset(self.sink.position()) {
                    println!("Receiving data... {}", line);
                    self.stats.progress_reports += 1;
                }
            }
        }

        Ok(())
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60).dimmed());
        println!("{}", "--- Session Summary ---".cyan().bold());
        println!("Data lines written: {}", self.stats.data_lines);
        println!("Handshakes answered: {}", self.stats.handshakes);
        println!("Control lines ignored: {}", self.stats.control_lines);
        if self.stats.rejected_lines > 0 {
            println!("Rejected records: {}", self.stats.rejected_lines.to_string().yellow());
        }
        if self.stats.invalid_utf8_lines > 0 {
            println!(
                "Invalid UTF-8 lines dropped: {}",
                self.stats.invalid_utf8_lines.to_string().yellow()
            );
        }
        println!("Bytes in log file: {}", self.sink.position());
        println!("{}", "=".repeat(60).dimmed());
    }
}

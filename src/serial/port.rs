//! Serial port configuration and connection management
//!
//! Opens the Teensy's USB CDC port and exposes it as a [`TelemetryLink`].

use super::link::{LineBuffer, TelemetryLink};
use crate::config::{DEFAULT_BAUD_RATE, DEFAULT_PORT, DEFAULT_READ_TIMEOUT};
use crate::error::{LoggerError, Result};
use colored::Colorize;
use log::debug;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 256;

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyACM0)
    pub port_path: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Longest wait for a line terminator
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl PortConfig {
    /// Create a new configuration with the Teensy defaults
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// An open serial port plus the bytes read past the last line break
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    config: PortConfig,
    buffer: LineBuffer,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|source| LoggerError::Connection {
                port: config.port_path.clone(),
                source,
            })?;

        debug!("Opened {} at {} baud", config.port_path, config.baud_rate);
        Ok(Self::from_port(port, config))
    }

    /// Wrap an already-open port
    pub fn from_port(port: Box<dyn SerialPort>, config: PortConfig) -> Self {
        Self {
            port,
            config,
            buffer: LineBuffer::new(),
        }
    }
}

impl TelemetryLink for SerialConnection {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let waiting = self.port.bytes_to_read()?;
        Ok(self.buffer.len() + waiting as usize)
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let deadline = Instant::now() + self.config.timeout;
        let mut chunk = [0u8; READ_CHUNK];
        let mut polled = false;

        loop {
            if let Some(line) = self.buffer.take_line() {
                return Ok(Some(line));
            }

            // At least one read per call, even with a zero timeout
            let remaining = deadline.saturating_duration_since(Instant::now());
            if polled && remaining.is_zero() {
                break;
            }
            polled = true;
            self.port.set_timeout(remaining)?;

            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.buffer.extend(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }

        Ok(self.buffer.take_partial())
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        debug!("Closed serial port {}", self.config.port_path);
    }
}

/// Information about a detected serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// PJRC's USB vendor ID
pub const TEENSY_VID: u16 = 0x16c0;

impl PortInfo {
    pub fn is_teensy(&self) -> bool {
        self.vid == Some(TEENSY_VID)
    }
}

/// List all available serial ports
pub fn list_ports() -> io::Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let (port_type, manufacturer, product, vid, pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    PortType::UsbSerial,
                    info.manufacturer,
                    info.product,
                    Some(info.vid),
                    Some(info.pid),
                ),
                serialport::SerialPortType::PciPort => (PortType::PciSerial, None, None, None, None),
                serialport::SerialPortType::BluetoothPort => {
                    (PortType::Bluetooth, None, None, None, None)
                }
                serialport::SerialPortType::Unknown => (PortType::Unknown, None, None, None, None),
            };

            PortInfo {
                path: p.port_name,
                port_type,
                manufacturer,
                product,
                vid,
                pid,
            }
        })
        .collect())
}

/// Print formatted list of available serial ports
pub fn print_ports() -> io::Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Check the Teensy's USB cable (some are charge-only)");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyACM*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in ports {
        let marker = if port.is_teensy() { " (Teensy)".green().to_string() } else { String::new() };
        println!("\n{}: {}{}", "Port".cyan(), port.path.white().bold(), marker);
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            println!("  VID:PID: {:04x}:{:04x}", vid, pid);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("{}", "Use: teensy-logger -p <PORT> to start logging".yellow());

    Ok(())
}

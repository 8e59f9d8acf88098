//! Telemetry line classification
//!
//! The Teensy sends free-text lines. Lines starting with `#` are control
//! messages; everything else is a CSV record that is logged verbatim.

/// Prefix the device uses to announce itself after a reset
pub const CONNECT_PREFIX: &str = "#CONNECTED:";

/// Marker for control and comment lines
pub const CONTROL_PREFIX: char = '#';

/// Command sent back when the device announces itself
pub const START_COMMAND: &[u8] = b"#CMD:START\n";

/// Column names of a PD-control telemetry record, in wire order
pub const FIELD_NAMES: [&str; 13] = [
    "timestamp",
    "roll",
    "pitch",
    "yaw",
    "gyro_x",
    "gyro_y",
    "gyro_z",
    "theta_motor",
    "theta_leg",
    "dtheta_leg",
    "walk_count",
    "target",
    "torque",
];

/// Number of fields in a well-formed data line
pub const FIELD_COUNT: usize = FIELD_NAMES.len();

/// Header line written at the top of every log file (without newline)
pub fn csv_header() -> String {
    FIELD_NAMES.join(",")
}

/// What a single received line means to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `#CONNECTED:<device>`; carries the full announcement
    Connected(&'a str),
    /// Any other `#` line
    Control(&'a str),
    /// Nothing left after trimming
    Empty,
    /// A CSV record
    Data(&'a str),
}

/// Classify an already-trimmed line
pub fn classify(line: &str) -> LineKind<'_> {
    if line.is_empty() {
        LineKind::Empty
    } else if line.starts_with(CONNECT_PREFIX) {
        LineKind::Connected(line)
    } else if line.starts_with(CONTROL_PREFIX) {
        LineKind::Control(line)
    } else {
        LineKind::Data(line)
    }
}

/// Why a data line failed strict validation
#[derive(Debug, Clone, PartialEq)]
pub enum RecordIssue {
    FieldCount { found: usize },
    NotNumeric { field: &'static str, value: String },
}

impl std::fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordIssue::FieldCount { found } => {
                write!(f, "expected {} fields, found {}", FIELD_COUNT, found)
            }
            RecordIssue::NotNumeric { field, value } => {
                write!(f, "field '{}' is not numeric: {:?}", field, value)
            }
        }
    }
}

/// Check that a data line has the full 13-field numeric shape.
///
/// Only used in strict mode; the default path logs lines untouched.
pub fn validate_record(line: &str) -> Result<(), RecordIssue> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(RecordIssue::FieldCount { found: fields.len() });
    }

    for (name, value) in FIELD_NAMES.iter().zip(fields) {
        if value.trim().parse::<f64>().is_err() {
            return Err(RecordIssue::NotNumeric {
                field: name,
                value: value.to_string(),
            });
        }
    }

    Ok(())
}

//! Logging session bookkeeping
//!
//! A session is one run of the logger. Its start time names the CSV file.

use crate::config::LoggerConfig;
use crate::error::{LoggerError, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// strftime pattern embedded in log file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// strftime pattern for the start time shown on the console
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FILE_PREFIX: &str = "teensy_log_";
const FILE_EXTENSION: &str = "csv";

/// One invocation of the logger
#[derive(Debug, Clone)]
pub struct Session {
    pub started_at: DateTime<Local>,
    pub port: String,
    pub baud_rate: u32,
    pub log_path: PathBuf,
}

impl Session {
    /// Start a session now: create the log directory and pick the file name.
    ///
    /// The file itself is not created here; that happens once the serial
    /// port is open.
    pub fn begin(config: &LoggerConfig) -> Result<Self> {
        Self::begin_at(config, Local::now())
    }

    /// Start a session with an explicit start time
    pub fn begin_at(config: &LoggerConfig, started_at: DateTime<Local>) -> Result<Self> {
        ensure_log_dir(&config.log_dir)?;
        let log_path = unique_log_path(&config.log_dir, &started_at);

        Ok(Self {
            started_at,
            port: config.port.clone(),
            baud_rate: config.baud_rate,
            log_path,
        })
    }

    /// Start time as shown in the console banner
    pub fn started_label(&self) -> String {
        self.started_at.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
    }
}

/// Create the log directory (and parents); an existing directory is fine
pub fn ensure_log_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| LoggerError::LogDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// `<dir>/teensy_log_<YYYYMMDD_HHMMSS>.csv`
pub fn log_file_path(dir: &Path, started_at: &DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{}{}.{}",
        FILE_PREFIX,
        started_at.format(FILE_TIMESTAMP_FORMAT),
        FILE_EXTENSION
    ))
}

/// Like [`log_file_path`], but adds `_1`, `_2`, ... if the name is taken
pub fn unique_log_path(dir: &Path, started_at: &DateTime<Local>) -> PathBuf {
    let base = log_file_path(dir, started_at);
    if !base.exists() {
        return base;
    }

    let stamp = started_at.format(FILE_TIMESTAMP_FORMAT);
    (1u32..)
        .map(|n| dir.join(format!("{}{}_{}.{}", FILE_PREFIX, stamp, n, FILE_EXTENSION)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_log_file_path_format() {
        let path = log_file_path(Path::new("/home/pi/teensy_logs"), &fixed_time());
        assert_eq!(
            path,
            PathBuf::from("/home/pi/teensy_logs/teensy_log_20240307_140509.csv")
        );
    }

    #[test]
    fn test_begin_creates_nested_dir() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("a").join("b");
        let config = LoggerConfig::default().with_log_dir(&log_dir);

        let session = Session::begin_at(&config, fixed_time()).unwrap();
        assert!(log_dir.is_dir());
        assert_eq!(session.log_path, log_dir.join("teensy_log_20240307_140509.csv"));
        assert_eq!(session.port, "/dev/ttyACM0");
        assert_eq!(session.baud_rate, 115200);
        assert_eq!(session.started_label(), "2024-03-07 14:05:09");
        // Nothing is written until the port is open
        assert!(!session.log_path.exists());
    }

    #[test]
    fn test_existing_dir_is_not_an_error() {
        let dir = tempdir().unwrap();
        ensure_log_dir(dir.path()).unwrap();
        ensure_log_dir(dir.path()).unwrap();
    }

    #[test]
    fn test_same_second_sessions_get_distinct_files() {
        let dir = tempdir().unwrap();
        let config = LoggerConfig::default().with_log_dir(dir.path());

        let first = Session::begin_at(&config, fixed_time()).unwrap();
        fs::write(&first.log_path, "taken").unwrap();
        let second = Session::begin_at(&config, fixed_time()).unwrap();
        fs::write(&second.log_path, "taken").unwrap();
        let third = Session::begin_at(&config, fixed_time()).unwrap();

        assert_ne!(first.log_path, second.log_path);
        assert_eq!(second.log_path, dir.path().join("teensy_log_20240307_140509_1.csv"));
        assert_eq!(third.log_path, dir.path().join("teensy_log_20240307_140509_2.csv"));
    }

    #[test]
    fn test_log_dir_blocked_by_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let err = ensure_log_dir(&blocker.join("logs")).unwrap_err();
        assert!(matches!(err, LoggerError::LogDir { .. }));
    }
}

//! CSV file sink
//!
//! Every line is flushed as soon as it is written so a crash or a pulled
//! power cable loses at most the line in flight.

use crate::error::{LoggerError, Result};
use crate::record::csv_header;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only CSV log file
pub struct CsvSink {
    file: File,
    path: PathBuf,
    position: u64,
}

impl CsvSink {
    /// Create (or truncate) the file and write the header
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| LoggerError::Sink {
            path: path.to_path_buf(),
            source,
        })?;

        let mut sink = Self {
            file,
            path: path.to_path_buf(),
            position: 0,
        };
        sink.write_line(&csv_header())?;
        Ok(sink)
    }

    /// Append one record followed by `\n`
    pub fn append(&mut self, line: &str) -> Result<()> {
        self.write_line(line)
    }

    /// Bytes written so far, header included
    pub fn position(&self) -> u64 {
        self.position
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let result = self
            .file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.write_all(b"\n"))
            .and_then(|_| self.file.flush());

        result.map_err(|source| LoggerError::Sink {
            path: self.path.clone(),
            source,
        })?;

        self.position += line.len() as u64 + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_header_is_durable_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let sink = CsvSink::create(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{}\n", csv_header()));
        assert_eq!(sink.position(), contents.len() as u64);
    }

    #[test]
    fn test_append_is_verbatim_and_ordered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.append("0.001,1.0,2.0").unwrap();
        sink.append("a , b ,c").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec![csv_header().as_str(), "0.001,1.0,2.0", "a , b ,c"]);
        assert_eq!(sink.position(), contents.len() as u64);
    }

    #[test]
    fn test_create_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "stale contents\nmore\n").unwrap();

        CsvSink::create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", csv_header()));
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("log.csv");
        assert!(matches!(CsvSink::create(&path), Err(LoggerError::Sink { .. })));
    }
}

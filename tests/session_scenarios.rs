use std::collections::VecDeque;
use std::fs;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use teensy_logger::record::csv_header;
use teensy_logger::{CsvSink, LoggerConfig, LoopSettings, SerialLogger, Session, TelemetryLink};

/// In-memory Teensy: replays lines, records what the logger sends back and
/// "presses Ctrl+C" once the script runs out
struct FakeTeensy {
    lines: VecDeque<&'static str>,
    sent: Vec<u8>,
    running: Arc<AtomicBool>,
}

impl TelemetryLink for FakeTeensy {
    fn bytes_available(&mut self) -> io::Result<usize> {
        match self.lines.front() {
            Some(line) => Ok(line.len() + 1),
            None => {
                self.running.store(false, Ordering::SeqCst);
                Ok(0)
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.lines.pop_front().map(|l| l.as_bytes().to_vec()))
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.sent.extend_from_slice(data);
        Ok(())
    }
}

#[test]
fn test_handshake_then_data_then_interrupt() {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::default()
        .with_log_dir(dir.path().join("teensy_logs"))
        .with_settle_delay(Duration::ZERO);
    let session = Session::begin(&config).unwrap();

    let data = "0.001,1.0,2.0,3.0,0.5,0.6,0.7,12.0,11.5,0.1,3,15.0,0.25";
    let running = Arc::new(AtomicBool::new(true));
    let teensy = FakeTeensy {
        lines: VecDeque::from(vec!["#CONNECTED:teensy41\r", "#INFO gains loaded", data]),
        sent: Vec::new(),
        running: Arc::clone(&running),
    };

    let sink = CsvSink::create(&session.log_path).unwrap();
    let settings = LoopSettings {
        idle_poll: Duration::ZERO,
        ..LoopSettings::from(&config)
    };
    let mut logger = SerialLogger::new(teensy, sink, settings, running);

    let stats = logger.run().unwrap().clone();
    assert_eq!(stats.handshakes, 1);
    assert_eq!(stats.control_lines, 1);
    assert_eq!(stats.data_lines, 1);

    let teensy = logger.into_link();
    assert_eq!(teensy.sent, b"#CMD:START\n");

    let contents = fs::read_to_string(&session.log_path).unwrap();
    assert_eq!(contents, format!("{}\n{}\n", csv_header(), data));

    let name = session.log_path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("teensy_log_"));
    assert!(name.ends_with(".csv"));
    // teensy_log_ + YYYYMMDD_HHMMSS + .csv
    assert_eq!(name.len(), "teensy_log_".len() + 15 + ".csv".len());
}

#[test]
fn test_missing_device_creates_no_file() {
    let dir = tempdir().unwrap();
    let config = LoggerConfig::default()
        .with_port("/dev/does-not-exist-teensy")
        .with_log_dir(dir.path())
        .with_settle_delay(Duration::ZERO);
    let session = Session::begin(&config).unwrap();
    let running = Arc::new(AtomicBool::new(true));

    match SerialLogger::open(&config, &session, running) {
        Err(err) => assert!(err.is_connection()),
        Ok(_) => panic!("opening a missing device should fail"),
    }

    assert!(!session.log_path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

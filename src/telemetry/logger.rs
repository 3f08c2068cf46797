//! # JSONL Telemetry Logger
//!
//! Writes one JSON object per line:
//!
//! ```text
//! {"timestamp":"2026-10-18T12:00:00.000+00:00","event":{"type":"battery","voltage":24.0,...}}
//! {"timestamp":"2026-10-18T12:00:00.004+00:00","diagnostic":{"kind":"checksum_mismatch",...}}
//! ```
//!
//! A new file is started every `max_records_per_file` records, and only the
//! newest `max_files_to_keep` files are kept in the log directory.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::TelemetrySink;
use crate::config::TelemetryConfig;
use crate::crsf::decoder::Diagnostic;
use crate::crsf::protocol::TelemetryEvent;
use crate::error::Result;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = ".jsonl";

#[derive(Serialize)]
struct Record<'a> {
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a TelemetryEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<&'a Diagnostic>,
}

/// Rotating JSONL telemetry log
#[derive(Debug)]
pub struct JsonlLogger {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    file_seq: u64,
}

impl JsonlLogger {
    /// Create a logger from the `[telemetry]` configuration section
    ///
    /// # Errors
    ///
    /// Returns error if the log directory cannot be created
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Self::with_limits(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Create a logger with explicit limits
    ///
    /// Limits of zero are treated as one.
    pub fn with_limits<P: AsRef<Path>>(
        log_dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir)?;

        info!("Telemetry log directory: {}", log_dir.display());

        Ok(Self {
            log_dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            file_seq: 0,
        })
    }

    /// File currently being written, once the first record is logged
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Flush buffered records to disk
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.file_seq,
            FILE_EXTENSION
        );
        self.file_seq += 1;

        let path = self.log_dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened telemetry log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest log files beyond `max_files_to_keep`
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
            })
            .collect();

        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names embed a timestamp and sequence number, so they sort oldest first
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old telemetry log {}", path.display());
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

impl TelemetrySink for JsonlLogger {
    fn on_event(&mut self, event: &TelemetryEvent) -> Result<()> {
        self.write_record(&Record {
            timestamp: timestamp(),
            event: Some(event),
            diagnostic: None,
        })
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        self.write_record(&Record {
            timestamp: timestamp(),
            event: None,
            diagnostic: Some(diagnostic),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::protocol::BatterySensor;
    use tempfile::TempDir;

    fn battery(voltage: f32) -> TelemetryEvent {
        TelemetryEvent::Battery(BatterySensor {
            voltage,
            current: None,
            capacity_used: None,
            remaining_percent: None,
        })
    }

    fn log_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_writes_one_json_object_per_line() {
        let dir = TempDir::new().unwrap();
        let mut logger = JsonlLogger::with_limits(dir.path(), 100, 10).unwrap();

        logger.on_event(&battery(24.0)).unwrap();
        logger
            .on_diagnostic(&Diagnostic::MalformedPayload {
                frame_type: 0x1E,
                required: 6,
                actual: 2,
            })
            .unwrap();

        let contents = fs::read_to_string(logger.current_path().unwrap()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"]["type"], "battery");
        assert_eq!(first["event"]["voltage"], 24.0);
        assert!(first["timestamp"].is_string());
        assert!(first.get("diagnostic").is_none());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["diagnostic"]["kind"], "malformed_payload");
        assert_eq!(second["diagnostic"]["frame_type"], 0x1E);
    }

    #[test]
    fn test_rotates_after_max_records() {
        let dir = TempDir::new().unwrap();
        let mut logger = JsonlLogger::with_limits(dir.path(), 2, 10).unwrap();

        for i in 0..5 {
            logger.on_event(&battery(i as f32)).unwrap();
        }

        let files = log_files(dir.path());
        assert_eq!(files.len(), 3);

        let line_counts: Vec<usize> = files
            .iter()
            .map(|path| fs::read_to_string(path).unwrap().lines().count())
            .collect();
        assert_eq!(line_counts, vec![2, 2, 1]);
    }

    #[test]
    fn test_keeps_only_newest_files() {
        let dir = TempDir::new().unwrap();
        let mut logger = JsonlLogger::with_limits(dir.path(), 1, 2).unwrap();

        for i in 0..5 {
            logger.on_event(&battery(i as f32)).unwrap();
        }

        let files = log_files(dir.path());
        assert_eq!(files.len(), 2);
        assert_eq!(files.last().unwrap().as_path(), logger.current_path().unwrap());

        // The surviving files hold the last two records
        let last: serde_json::Value =
            serde_json::from_str(fs::read_to_string(&files[1]).unwrap().trim()).unwrap();
        assert_eq!(last["event"]["voltage"], 4.0);
    }

    #[test]
    fn test_prune_ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut logger = JsonlLogger::with_limits(dir.path(), 1, 1).unwrap();

        logger.on_event(&battery(1.0)).unwrap();
        logger.on_event(&battery(2.0)).unwrap();

        // notes.txt plus the newest log
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(log_files(dir.path()).len(), 2);
    }

    #[test]
    fn test_creates_missing_log_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let config = TelemetryConfig {
            enabled: true,
            log_dir: nested.to_string_lossy().into_owned(),
            max_records_per_file: 10,
            max_files_to_keep: 3,
            format: "jsonl".to_string(),
        };

        let logger = JsonlLogger::new(&config).unwrap();
        assert!(nested.is_dir());
        assert!(logger.current_path().is_none());
    }
}

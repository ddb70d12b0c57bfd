//! Append-only CSV log of benchmark runs.
//!
//! Each append opens the file, takes an exclusive advisory lock, decides on
//! the header while holding it, writes the header and row with a single
//! `write_all`, and syncs before the lock is dropped with the handle. A
//! failed write or sync truncates the file back to its length before the
//! append, so a partial row never stays on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::run::{LogRecord, RunMetrics, RunParams, LOG_HEADER};

/// Default log file name, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "wrk_results.csv";

/// What a single append did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReport {
    /// Whether the header row was written because the file was empty.
    pub header_written: bool,
    /// Bytes appended, header and repair newline included.
    pub bytes_written: usize,
}

/// Handle on the results log file.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl Default for ResultsLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

impl ResultsLog {
    /// Names the log at `path`. Nothing is opened until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record`, writing the header first if the file is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, locked, written or
    /// synced. Nothing is written when the row fails to serialize, and the
    /// file is restored to its previous length when the write fails.
    pub fn append(&self, record: &LogRecord) -> Result<AppendReport> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        FileExt::lock_exclusive(&file)?;

        let len = file.metadata()?.len();
        let header_written = len == 0;
        let mut buf = Vec::new();
        if len > 0 && !ends_with_newline(&mut file, len)? {
            debug!(path = %self.path.display(), "terminating partial trailing line");
            buf.push(b'\n');
        }
        {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut buf);
            if header_written {
                writer.write_record(LOG_HEADER)?;
            }
            writer.serialize(LogRow::from_record(record))?;
            writer.flush()?;
        }

        if let Err(err) = write_synced(&mut file, &buf) {
            if let Err(truncate_err) = file.set_len(len) {
                warn!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "could not roll back failed append"
                );
            }
            return Err(err.into());
        }
        info!(
            path = %self.path.display(),
            header_written,
            timestamp = %record.timestamp,
            "appended benchmark row"
        );
        Ok(AppendReport {
            header_written,
            bytes_written: buf.len(),
        })
    }

    /// Reads every row back, oldest first. A missing file has no rows.
    pub fn read_records(&self) -> Result<Vec<LogRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        FileExt::lock_shared(&file)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize::<LogRow>() {
            records.push(row?.into_record());
        }
        Ok(records)
    }
}

/// The log fields of `record`, rendered exactly as [`ResultsLog::append`]
/// writes them.
pub fn row_fields(record: &LogRecord) -> Result<Vec<String>> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buf);
        writer.serialize(LogRow::from_record(record))?;
        writer.flush()?;
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(buf.as_slice());
    let mut row = csv::StringRecord::new();
    reader.read_record(&mut row)?;
    Ok(row.iter().map(str::to_string).collect())
}

fn write_synced(file: &mut File, buf: &[u8]) -> io::Result<()> {
    file.write_all(buf)?;
    file.sync_data()
}

fn ends_with_newline(file: &mut File, len: u64) -> Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Flat on-disk shape of a [`LogRecord`]; field order is the column order.
#[derive(Debug, Serialize, Deserialize)]
struct LogRow {
    timestamp: String,
    threads: String,
    connections: String,
    duration: String,
    server: String,
    rps: f64,
    transfer_mb_s: f64,
    latency_ms: f64,
    connect_errors: u64,
}

impl LogRow {
    fn from_record(record: &LogRecord) -> Self {
        Self {
            timestamp: record.timestamp.clone(),
            threads: record.params.threads.clone(),
            connections: record.params.connections.clone(),
            duration: record.params.duration.clone(),
            server: record.params.server.clone(),
            rps: record.metrics.rps,
            transfer_mb_s: record.metrics.transfer_mb_s,
            latency_ms: record.metrics.latency_ms,
            connect_errors: record.metrics.connect_errors,
        }
    }

    fn into_record(self) -> LogRecord {
        LogRecord {
            timestamp: self.timestamp,
            params: RunParams {
                threads: self.threads,
                connections: self.connections,
                duration: self.duration,
                server: self.server,
            },
            metrics: RunMetrics {
                rps: self.rps,
                transfer_mb_s: self.transfer_mb_s,
                latency_ms: self.latency_ms,
                connect_errors: self.connect_errors,
            },
        }
    }
}

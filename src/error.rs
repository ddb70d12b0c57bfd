//! Errors raised while recording a benchmark run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for recorder operations.
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Error type for a single benchmark recording.
///
/// Every variant is fatal to the run. A metric missing from the tool's report
/// is not an error; it is recorded as zero.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The load-generation tool could not be found.
    #[error("load generator not found: {program}")]
    ToolNotFound {
        /// Program that was looked up.
        program: PathBuf,
    },
    /// The load-generation tool could not be started or its output collected.
    #[error("failed to run {program}: {source}")]
    Launch {
        /// Program that was executed.
        program: PathBuf,
        /// Underlying spawn or pipe error.
        source: io::Error,
    },
    /// The tool ran but exited unsuccessfully.
    #[error("{program} exited with {}{}", describe_code(.code), describe_stderr(.stderr))]
    ToolFailed {
        /// Program that was executed.
        program: PathBuf,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Trimmed standard error of the tool.
        stderr: String,
    },
    /// Opening, locking or writing the results log failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Serializing or reading back a CSV row failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Loading the configuration file failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

//! Values flowing through one benchmark run: what was asked for, what was
//! measured, and the row that ends up in the results log.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the log. Lexicographic order matches time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Column names of the results log, in order.
pub const LOG_HEADER: [&str; 9] = [
    "timestamp",
    "threads",
    "connections",
    "duration",
    "server",
    "rps",
    "transfer_mb_s",
    "latency_ms",
    "connect_errors",
];

/// Parameters handed to the load generator.
///
/// Values are opaque: they are forwarded to the tool and persisted exactly as
/// given. Rejecting nonsense is the tool's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Worker thread count (`-t`).
    pub threads: String,
    /// Open connection count (`-c`).
    pub connections: String,
    /// Test duration (`-d`), e.g. `30s`.
    pub duration: String,
    /// Target URL or address.
    pub server: String,
}

impl RunParams {
    /// Builds parameters from anything string-like.
    pub fn new(
        threads: impl Into<String>,
        connections: impl Into<String>,
        duration: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            threads: threads.into(),
            connections: connections.into(),
            duration: duration.into(),
            server: server.into(),
        }
    }
}

/// Headline numbers extracted from a load-generator report.
///
/// Every field defaults to zero when the report does not contain it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Requests completed per second.
    pub rps: f64,
    /// Transfer rate in MB/s.
    pub transfer_mb_s: f64,
    /// Mean latency in milliseconds.
    pub latency_ms: f64,
    /// Connection-level socket errors.
    pub connect_errors: u64,
}

/// One row of the results log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Local time the row was produced, formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    /// Parameters the tool was run with.
    #[serde(flatten)]
    pub params: RunParams,
    /// Metrics parsed from the tool's report.
    #[serde(flatten)]
    pub metrics: RunMetrics,
}

impl LogRecord {
    /// Stamps `params` and `metrics` with the current local time.
    pub fn now(params: RunParams, metrics: RunMetrics) -> Self {
        Self::at(Local::now().naive_local(), params, metrics)
    }

    /// Stamps `params` and `metrics` with an explicit time.
    pub fn at(time: NaiveDateTime, params: RunParams, metrics: RunMetrics) -> Self {
        Self {
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            params,
            metrics,
        }
    }

    /// Parses the stored timestamp back into a time value.
    pub fn time(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

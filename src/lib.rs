//! Benchmark run recorder.
//!
//! Runs an HTTP load generator (`wrk` by default), pulls requests/sec,
//! transfer/sec, mean latency and connect errors out of its report, and
//! appends them as one row of a CSV log.
//!
//! ```no_run
//! use benchlog::{Recorder, ResultsLog, RunParams, WrkCommand};
//!
//! let recorder = Recorder::new(WrkCommand::default(), ResultsLog::default());
//! let recorded = recorder.record(RunParams::new("4", "100", "30s", "http://127.0.0.1:8080/"))?;
//! println!("{} req/s", recorded.record.metrics.rps);
//! # Ok::<(), benchlog::RecorderError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod recorder;
pub mod results_log;
pub mod run;

pub use config::{ConfigError, RecorderConfig};
pub use error::{RecorderError, Result};
pub use generator::{LoadGenerator, ToolOutput, WrkCommand};
pub use metrics::parse_metrics;
pub use recorder::{ExitPolicy, Recorded, Recorder};
pub use results_log::{row_fields, AppendReport, ResultsLog};
pub use run::{LogRecord, RunMetrics, RunParams};

//! One benchmark run, end to end: run the tool, read its report, log a row.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RecorderError, Result};
use crate::generator::LoadGenerator;
use crate::metrics::parse_metrics;
use crate::results_log::{AppendReport, ResultsLog};
use crate::run::{LogRecord, RunParams};

/// What to do when the load generator exits unsuccessfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Fail the run and write nothing.
    #[default]
    Fail,
    /// Log a warning and record whatever the report contains.
    Record,
}

/// Outcome of a successful [`Recorder::record`].
#[derive(Debug, Clone)]
pub struct Recorded {
    /// The row that was appended.
    pub record: LogRecord,
    /// What the append did to the log file.
    pub append: AppendReport,
    /// Exit code of the load generator.
    pub exit_code: Option<i32>,
}

/// Runs a load generator and appends its headline metrics to a log.
#[derive(Debug)]
pub struct Recorder<G> {
    generator: G,
    log: ResultsLog,
    exit_policy: ExitPolicy,
}

impl<G: LoadGenerator> Recorder<G> {
    /// Creates a recorder writing to `log` with the default [`ExitPolicy`].
    pub fn new(generator: G, log: ResultsLog) -> Self {
        Self {
            generator,
            log,
            exit_policy: ExitPolicy::default(),
        }
    }

    /// Overrides the exit policy.
    pub fn with_exit_policy(mut self, exit_policy: ExitPolicy) -> Self {
        self.exit_policy = exit_policy;
        self
    }

    /// The log rows are appended to.
    pub fn log(&self) -> &ResultsLog {
        &self.log
    }

    /// The load generator in use.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Runs one load test with `params` and appends the result.
    ///
    /// Blocks for as long as the load generator runs.
    ///
    /// # Errors
    ///
    /// Fails without touching the log if the tool cannot be launched, or if
    /// it exits unsuccessfully under [`ExitPolicy::Fail`]. Fails if the row
    /// cannot be appended. Metrics missing from the report are not errors.
    pub fn record(&self, params: RunParams) -> Result<Recorded> {
        let output = self.generator.run(&params)?;
        if !output.success() {
            match self.exit_policy {
                ExitPolicy::Fail => {
                    return Err(RecorderError::ToolFailed {
                        program: self.generator.program().to_path_buf(),
                        code: output.code,
                        stderr: output.stderr.trim().to_string(),
                    });
                }
                ExitPolicy::Record => warn!(
                    program = %self.generator.program().display(),
                    code = ?output.code,
                    "load generator failed; recording its partial report"
                ),
            }
        }

        let metrics = parse_metrics(&output.stdout);
        info!(
            rps = metrics.rps,
            transfer_mb_s = metrics.transfer_mb_s,
            latency_ms = metrics.latency_ms,
            connect_errors = metrics.connect_errors,
            "parsed load generator report"
        );
        let record = LogRecord::now(params, metrics);
        let append = self.log.append(&record)?;
        Ok(Recorded {
            record,
            append,
            exit_code: output.code,
        })
    }
}

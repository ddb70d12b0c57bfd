//! The load generator seam.
//!
//! [`LoadGenerator`] is the only way the recorder reaches the outside world
//! for measurements; [`WrkCommand`] is the production implementation and
//! tests substitute their own.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::debug;

use crate::error::{RecorderError, Result};
use crate::run::RunParams;

/// Default program name, resolved through `PATH`.
pub const DEFAULT_WRK_BIN: &str = "wrk";

/// Everything the tool left behind after it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ToolOutput {
    /// Output of a run that exited with status 0.
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
        }
    }

    /// Whether the tool reported success.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a load test and returns its captured output.
///
/// Implementations block until the test finishes. An error means the tool
/// could not be run at all; a tool that ran and failed returns `Ok` with a
/// non-zero [`ToolOutput::code`].
pub trait LoadGenerator {
    /// Program name used in diagnostics.
    fn program(&self) -> &Path;

    /// Runs one load test with `params`.
    fn run(&self, params: &RunParams) -> Result<ToolOutput>;
}

/// Runs `wrk` (or a compatible binary) as a child process.
#[derive(Debug, Clone)]
pub struct WrkCommand {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl Default for WrkCommand {
    fn default() -> Self {
        Self::new(DEFAULT_WRK_BIN)
    }
}

impl WrkCommand {
    /// Uses `program` as the load generator binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments placed before the thread/connection/duration flags.
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argument list for `params`.
    pub fn args(&self, params: &RunParams) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push(format!("-t{}", params.threads));
        args.push(format!("-c{}", params.connections));
        args.push(format!("-d{}", params.duration));
        args.push(params.server.clone());
        args
    }
}

impl LoadGenerator for WrkCommand {
    fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, params: &RunParams) -> Result<ToolOutput> {
        let args = self.args(params);
        debug!(program = %self.program.display(), ?args, "spawning load generator");
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| launch_error(&self.program, source))?;
        let result = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };
        debug!(
            program = %self.program.display(),
            code = ?result.code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            stdout_bytes = result.stdout.len(),
            "load generator exited"
        );
        Ok(result)
    }
}

fn launch_error(program: &Path, source: io::Error) -> RecorderError {
    if source.kind() == io::ErrorKind::NotFound {
        RecorderError::ToolNotFound {
            program: program.to_path_buf(),
        }
    } else {
        RecorderError::Launch {
            program: program.to_path_buf(),
            source,
        }
    }
}

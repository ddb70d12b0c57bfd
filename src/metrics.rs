//! Extraction of the headline metrics from a wrk report.
//!
//! Only four numbers are read. Each pattern is searched independently, so a
//! truncated report still yields whatever it does contain.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::run::RunMetrics;

static REQUESTS_PER_SEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Requests/sec:\s+([\d.]+)").expect("valid regex"));
static TRANSFER_PER_SEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Transfer/sec:\s+([\d.]+)").expect("valid regex"));
// First match wins; in wrk's thread stats table that is the mean.
static LATENCY_MS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Latency\s+([\d.]+)ms").expect("valid regex"));
static CONNECT_ERRORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Socket errors: connect (\d+)").expect("valid regex"));

/// Parses the four headline metrics out of `report`.
///
/// A metric that is absent, or whose captured text is not a number (for
/// example `1.2.3`), is reported as zero.
pub fn parse_metrics(report: &str) -> RunMetrics {
    RunMetrics {
        rps: capture(&REQUESTS_PER_SEC, report, "rps").unwrap_or_default(),
        transfer_mb_s: capture(&TRANSFER_PER_SEC, report, "transfer_mb_s").unwrap_or_default(),
        latency_ms: capture(&LATENCY_MS, report, "latency_ms").unwrap_or_default(),
        connect_errors: capture(&CONNECT_ERRORS, report, "connect_errors").unwrap_or_default(),
    }
}

fn capture<T: FromStr>(pattern: &Regex, report: &str, metric: &'static str) -> Option<T> {
    let Some(token) = pattern
        .captures(report)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        debug!(metric, "metric not present in report");
        return None;
    };
    let parsed = token.parse().ok();
    if parsed.is_none() {
        debug!(metric, token, "metric token is not a number");
    }
    parsed
}

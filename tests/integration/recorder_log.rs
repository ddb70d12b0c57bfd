#![allow(missing_docs)]

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

use benchlog::{
    run::LOG_HEADER, LoadGenerator, LogRecord, Recorder, RecorderError, ResultsLog, RunMetrics,
    RunParams, ToolOutput,
};
use csv::ReaderBuilder;
use tempfile::TempDir;

const SAMPLE_REPORT: &str = "Running 10s test @ http://127.0.0.1:8080/
  2 threads and 10 connections
  Thread Stats   Avg      Stdev     Max   +/- Stdev
    Latency   812.00us  143.00us   4.71ms   80.00%
    Latency     1.45ms    0.30ms   4.71ms   81.10%
    Req/Sec     3.51k   201.33     3.90k    68.50%
  69893 requests in 10.01s, 8.27MB read
Requests/sec:   6982.12
Transfer/sec:      0.83MB
";

/// Replays a fixed report for every run.
struct ScriptedGenerator {
    report: String,
    runs: Cell<usize>,
}

impl ScriptedGenerator {
    fn new(report: &str) -> Self {
        Self {
            report: report.to_string(),
            runs: Cell::new(0),
        }
    }
}

impl LoadGenerator for ScriptedGenerator {
    fn program(&self) -> &Path {
        Path::new("scripted-wrk")
    }

    fn run(&self, _params: &RunParams) -> benchlog::Result<ToolOutput> {
        self.runs.set(self.runs.get() + 1);
        Ok(ToolOutput::succeeded(self.report.clone()))
    }
}

fn setup_log(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.csv"));
    (dir, path)
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("open log");
    reader
        .records()
        .map(|r| r.expect("row").iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn repeated_runs_write_one_header_and_n_rows() {
    let (_dir, path) = setup_log("repeated");
    let recorder = Recorder::new(ScriptedGenerator::new(SAMPLE_REPORT), ResultsLog::new(&path));

    for i in 0..5 {
        let connections = (10 * (i + 1)).to_string();
        let params = RunParams::new("2", connections, "10s", "http://127.0.0.1:8080/");
        let recorded = recorder.record(params).expect("record run");
        assert_eq!(recorded.append.header_written, i == 0);
    }
    assert_eq!(recorder.generator().runs.get(), 5);

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0], LOG_HEADER);
    for (i, row) in rows[1..].iter().enumerate() {
        assert_eq!(row.len(), 9);
        assert_eq!(row[1], "2");
        assert_eq!(row[2], (10 * (i + 1)).to_string());
        assert_eq!(row[3], "10s");
        assert_eq!(row[4], "http://127.0.0.1:8080/");
        assert_eq!(row[5], "6982.12");
        assert_eq!(row[6], "0.83");
        // The microsecond mean is skipped; the first millisecond latency wins.
        assert_eq!(row[7], "1.45");
        assert_eq!(row[8], "0");
    }

    let timestamps: Vec<String> = rows[1..].iter().map(|r| r[0].clone()).collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted, "timestamps should sort in append order");
}

#[test]
fn existing_log_keeps_single_header() {
    let (_dir, path) = setup_log("existing");
    fs::write(
        &path,
        format!(
            "{}\n2024-01-01T00:00:00.000000,1,1,1s,http://old/,1.0,0.1,2.0,0\n",
            LOG_HEADER.join(",")
        ),
    )
    .expect("seed log");

    let recorder = Recorder::new(ScriptedGenerator::new(SAMPLE_REPORT), ResultsLog::new(&path));
    let recorded = recorder
        .record(RunParams::new("4", "64", "5s", "http://new/"))
        .expect("record run");
    assert!(!recorded.append.header_written);

    let contents = fs::read_to_string(&path).expect("read log");
    assert_eq!(contents.matches("timestamp,threads").count(), 1);

    let records = recorder.log().read_records().expect("read back");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].params.server, "http://old/");
    assert_eq!(records[1].params.server, "http://new/");
}

#[test]
fn partial_report_records_zero_for_missing_fields() {
    let (_dir, path) = setup_log("partial");
    let recorder = Recorder::new(
        ScriptedGenerator::new("Requests/sec:    120.50\n"),
        ResultsLog::new(&path),
    );
    let recorded = recorder
        .record(RunParams::new("1", "1", "1s", "http://x/"))
        .expect("record run");
    assert_eq!(
        recorded.record.metrics,
        RunMetrics {
            rps: 120.5,
            ..RunMetrics::default()
        }
    );
    let rows = read_rows(&path);
    assert_eq!(&rows[1][5..], &["120.5", "0.0", "0.0", "0"]);
}

#[test]
fn concurrent_appends_never_duplicate_header() {
    let (_dir, path) = setup_log("concurrent");
    let writers = 8;
    let rows_per_writer = 10;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let log = ResultsLog::new(path);
                barrier.wait();
                for i in 0..rows_per_writer {
                    let record = LogRecord::now(
                        RunParams::new(w.to_string(), i.to_string(), "1s", "http://race/"),
                        RunMetrics {
                            rps: (w * 100 + i) as f64,
                            transfer_mb_s: 1.0,
                            latency_ms: 2.0,
                            connect_errors: w as u64,
                        },
                    );
                    log.append(&record).expect("append");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let contents = fs::read_to_string(&path).expect("read log");
    assert_eq!(contents.matches("timestamp,threads").count(), 1);
    let records = ResultsLog::new(&path).read_records().expect("read back");
    assert_eq!(records.len(), writers * rows_per_writer);
    for w in 0..writers {
        let count = records
            .iter()
            .filter(|r| r.params.threads == w.to_string())
            .count();
        assert_eq!(count, rows_per_writer);
    }
}

#[test]
fn unwritable_log_fails_without_panicking() {
    let (dir, _path) = setup_log("unused");
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file").expect("create blocker");

    let recorder = Recorder::new(
        ScriptedGenerator::new(SAMPLE_REPORT),
        ResultsLog::new(blocker.join("wrk_results.csv")),
    );
    let err = recorder
        .record(RunParams::new("1", "1", "1s", "http://x/"))
        .expect_err("parent is a file");
    assert!(matches!(err, RecorderError::Io(_)), "unexpected error: {err}");
}

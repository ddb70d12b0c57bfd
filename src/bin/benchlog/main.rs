//! Binary entry point for the benchmark recorder.
#![forbid(unsafe_code)]

mod ui;

use std::error::Error;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use benchlog::{
    generator::DEFAULT_WRK_BIN, results_log::DEFAULT_LOG_PATH, row_fields, run::LOG_HEADER,
    ExitPolicy, LoadGenerator, Recorded, Recorder, RecorderConfig, ResultsLog, RunParams,
    WrkCommand,
};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;
use ui::{ColorChoice, Console};

#[derive(Parser, Debug)]
#[command(
    name = "benchlog",
    version,
    about = "Run wrk against a server and append its headline metrics to a CSV log"
)]
struct Cli {
    #[arg(value_name = "THREADS", required_unless_present = "history")]
    threads: Option<String>,

    #[arg(value_name = "CONNECTIONS", required_unless_present = "history")]
    connections: Option<String>,

    #[arg(value_name = "DURATION", required_unless_present = "history")]
    duration: Option<String>,

    #[arg(value_name = "SERVER", required_unless_present = "history")]
    server: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Results log to append to [default: wrk_results.csv]"
    )]
    log: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Load generator binary [default: wrk]")]
    wrk_bin: Option<PathBuf>,

    #[arg(
        long = "wrk-arg",
        value_name = "ARG",
        action = ArgAction::Append,
        allow_hyphen_values = true,
        help = "Extra argument for the load generator (repeatable)"
    )]
    wrk_args: Vec<String>,

    #[arg(long, help = "Record a row even when the load generator exits unsuccessfully")]
    record_failed: bool,

    #[arg(long, value_name = "FILE", help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print the rows already in the log and exit")]
    history: bool,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for the confirmation"
    )]
    format: OutputFormat,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, help = "When to color output")]
    color: ColorChoice,

    #[arg(short, long, help = "Plain output without spinner or colors")]
    quiet: bool,
}

impl Cli {
    fn params(&self) -> Option<RunParams> {
        Some(RunParams::new(
            self.threads.clone()?,
            self.connections.clone()?,
            self.duration.clone()?,
            self.server.clone()?,
        ))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    if let Err(err) = run(cli) {
        error!(%err, "benchmark recording failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match cli.config.as_deref() {
        Some(path) => RecorderConfig::load(path)?,
        None => RecorderConfig::default(),
    };
    let console = Console::new(cli.color, cli.quiet);
    let log_path = cli
        .log
        .clone()
        .or_else(|| config.log.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));
    let log = ResultsLog::new(log_path);

    if cli.history {
        return print_history(&console, &log, cli.format);
    }

    let params = cli
        .params()
        .ok_or("THREADS, CONNECTIONS, DURATION and SERVER are required")?;
    let exit_policy = if cli.record_failed {
        ExitPolicy::Record
    } else {
        config.exit_policy.unwrap_or_default()
    };
    let wrk_bin = cli
        .wrk_bin
        .clone()
        .or_else(|| config.wrk_bin.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WRK_BIN));
    let wrk_args = if cli.wrk_args.is_empty() {
        config.wrk_args.clone()
    } else {
        cli.wrk_args.clone()
    };
    let generator = WrkCommand::new(wrk_bin).with_extra_args(wrk_args);
    let recorder = Recorder::new(generator, log).with_exit_policy(exit_policy);

    let running = console.running(&format!(
        "{} -t{} -c{} -d{} {}",
        recorder.generator().program().display(),
        params.threads,
        params.connections,
        params.duration,
        params.server
    ));
    let result = recorder.record(params);
    let elapsed = running.finish();
    let recorded = result?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recorded.record)?),
        OutputFormat::Text => print_recorded(&console, recorder.log(), &recorded, elapsed)?,
    }
    Ok(())
}

fn print_recorded(
    console: &Console,
    log: &ResultsLog,
    recorded: &Recorded,
    elapsed: Duration,
) -> Result<(), Box<dyn Error>> {
    if recorded.exit_code != Some(0) {
        let status = recorded
            .exit_code
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "a signal".to_string());
        console.warn(&format!("load generator exited with {status}; row recorded anyway"));
    }
    console.table("recorded", &LOG_HEADER, &[row_fields(&recorded.record)?]);
    let new_log = if recorded.append.header_written {
        " (new log)"
    } else {
        ""
    };
    console.done(&format!(
        "appended to {}{new_log} after {:.1}s",
        log.path().display(),
        elapsed.as_secs_f64()
    ));
    Ok(())
}

fn print_history(
    console: &Console,
    log: &ResultsLog,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let records = log.read_records()?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        console.note(&format!("no runs recorded in {}", log.path().display()));
        return Ok(());
    }
    let rows = records
        .iter()
        .map(row_fields)
        .collect::<benchlog::Result<Vec<_>>>()?;
    console.table(
        &format!("{} ({} runs)", log.path().display(), records.len()),
        &LOG_HEADER,
        &rows,
    );
    Ok(())
}

//! Terminal output for the recorder: a spinner while the load generator runs
//! and column-aligned tables of log rows.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

pub struct Console {
    color: bool,
    quiet: bool,
}

impl Console {
    pub fn new(choice: ColorChoice, quiet: bool) -> Self {
        let color = match choice {
            ColorChoice::Auto => std::io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Self {
            color: color && !quiet,
            quiet,
        }
    }

    /// Spinner on stderr showing `command` until [`Running::finish`].
    pub fn running(&self, command: &str) -> Running {
        let bar = (!self.quiet).then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
                bar.set_style(style);
            }
            bar.set_message(command.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        Running {
            bar,
            start: Instant::now(),
        }
    }

    /// Prints `rows` under `columns`, padding each column to its widest cell.
    pub fn table(&self, title: &str, columns: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        println!("{}", self.paint(Style::new().bold(), title));
        let header = padded(columns.iter().copied(), &widths);
        println!("{}", self.paint(Style::new().fg(Color::Cyan), &header));
        for row in rows {
            println!("{}", padded(row.iter().map(String::as_str), &widths));
        }
    }

    pub fn done(&self, message: &str) {
        println!("{}", self.paint(Style::new().fg(Color::Green), message));
    }

    pub fn note(&self, message: &str) {
        println!("{message}");
    }

    pub fn warn(&self, message: &str) {
        let label = if self.color {
            Style::new().fg(Color::Yellow).bold().paint("warning:").to_string()
        } else {
            "warning:".to_string()
        };
        eprintln!("{label} {message}");
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

pub struct Running {
    bar: Option<ProgressBar>,
    start: Instant,
}

impl Running {
    /// Clears the spinner and returns how long the run took.
    pub fn finish(self) -> Duration {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        self.start.elapsed()
    }
}

fn padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

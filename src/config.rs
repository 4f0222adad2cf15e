//! Command-line configuration for the `csv-tail` binary.

use crate::options::WatchOptions;
use crate::parse::CsvFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Print rows from growing or rotating CSV files as they become available.
#[derive(Debug, Parser)]
#[command(name = "csv-tail", version, about)]
pub struct Config {
    /// Seconds between polls; zero or negative polls continuously.
    #[arg(
        long,
        env = "CSV_TAIL_INTERVAL",
        default_value_t = 5,
        allow_negative_numbers = true,
        global = true
    )]
    pub interval: i64,

    /// Log filter, e.g. `info` or `csv_tail=debug`.
    #[arg(long, env = "CSV_TAIL_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format (text, json).
    #[arg(long, env = "CSV_TAIL_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Wake up early on filesystem change notifications.
    #[arg(long, env = "CSV_TAIL_NOTIFY", global = true)]
    pub notify: bool,

    /// Field delimiter, a single ASCII character.
    #[arg(long, default_value = ",", value_parser = parse_delimiter, global = true)]
    pub delimiter: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Tail one file and print each appended row.
    Append {
        /// CSV file to tail; it may not exist yet.
        file: PathBuf,

        /// Treat the first line as data instead of skipping it as a header.
        #[arg(long)]
        keep_header: bool,
    },
    /// Print the newest `<prefix>*.csv` in a directory whenever it changes.
    Latest {
        dir: PathBuf,
        prefix: String,
    },
}

impl Config {
    pub fn watch_options(&self) -> WatchOptions {
        let skip_header = match &self.command {
            Command::Append { keep_header, .. } => !keep_header,
            Command::Latest { .. } => false,
        };

        WatchOptions::default()
            .with_interval_secs(self.interval)
            .with_skip_header(skip_header)
            .with_notify(self.notify)
            .with_format(CsvFormat {
                delimiter: self.delimiter,
                ..CsvFormat::default()
            })
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(format!("delimiter must be a single ASCII character, got {value:?}")),
    }
}

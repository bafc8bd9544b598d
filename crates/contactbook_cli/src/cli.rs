//! Command-line arguments.

use clap::Parser;
use contactbook_core::LogLevel;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "contactbook")]
#[command(about = "Personal contact manager for the terminal")]
#[command(version)]
pub struct Args {
    /// Directory holding `contacts.sqlite3` and `logs/`.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep contacts in memory only; nothing is written to disk.
    #[arg(long, default_value_t = false)]
    pub in_memory: bool,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Import contacts from a JSON file before starting.
    #[arg(long, value_name = "FILE")]
    pub import: Option<PathBuf>,

    /// Write all contacts to a JSON file and exit.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Write a copy of the database to FILE and exit.
    #[arg(long, value_name = "FILE")]
    pub backup: Option<PathBuf>,
}

impl Args {
    /// Whether the run ends after the one-shot file operations.
    pub fn is_batch(&self) -> bool {
        self.export.is_some() || self.backup.is_some()
    }

    pub fn log_level_or_default(&self) -> LogLevel {
        self.log_level.unwrap_or_else(LogLevel::default_for_build)
    }
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value.parse::<LogLevel>().map_err(|err| err.to_string())
}

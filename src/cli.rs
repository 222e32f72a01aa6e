use clap::Parser;
use std::path::PathBuf;

use crate::domain::TableConfig;

/// A tui data table with search, column filters, sorting, paging and resizable columns.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// CSV, Parquet or Arrow IPC file to show. Without it the sample users are shown.
    pub file: Option<String>,

    /// Rows per page
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: u16,

    /// Initial width of every column (10 units per terminal cell)
    #[arg(long, default_value_t = 150)]
    pub column_width: u16,

    /// Columns can only be resized to widths above this
    #[arg(long, default_value_t = 50)]
    pub min_column_width: u16,

    /// Heading shown above the table
    #[arg(long)]
    pub title: Option<String>,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Log file, defaults to datatable.log in the temp directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log everything down to trace level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn to_config(&self) -> TableConfig {
        let heading = match (&self.title, &self.file) {
            (Some(title), _) => title.clone(),
            (None, Some(file)) => file.clone(),
            (None, None) => TableConfig::default().heading,
        };
        TableConfig::default()
            .event_poll_time(self.poll_ms)
            .page_size(usize::from(self.page_size))
            .default_column_width(self.column_width)
            .min_column_width(self.min_column_width)
            .heading(heading)
    }
}

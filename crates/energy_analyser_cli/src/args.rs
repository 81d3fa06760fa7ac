use std::path::PathBuf;

use clap::Parser;
use energy_analyser_consolidate::EnumTimestampFormat;

/// Consolidate power-meter CSV exports into one Excel workbook.
#[derive(Debug, Clone, Parser)]
#[command(name = "energy-analyser", version)]
pub struct Cli {
    /// CSV files or directories holding them.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Glob applied to directory entries (case-insensitive) [default: *.csv].
    #[arg(long)]
    pub pattern: Option<String>,

    /// Output workbook path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML file with `[source]` and `[run]` tables.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Column label of the date field, e.g. `A`.
    #[arg(long)]
    pub date_column: Option<String>,

    /// Column label of the time field, e.g. `B`.
    #[arg(long)]
    pub time_column: Option<String>,

    /// Column label of the power field, e.g. `AO`.
    #[arg(long)]
    pub power_column: Option<String>,

    /// 1-based row holding the column labels.
    #[arg(long)]
    pub header_row: Option<usize>,

    /// Field delimiter: one character, or `tab`.
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Date layout: `DD/MM/YYYY` or `YYYY-MM-DD`.
    #[arg(long)]
    pub timestamp_format: Option<EnumTimestampFormat>,

    /// Output name of the date column.
    #[arg(long)]
    pub field_date: Option<String>,

    /// Output name of the time column.
    #[arg(long)]
    pub field_time: Option<String>,

    /// Output name of the power column.
    #[arg(long)]
    pub field_power: Option<String>,

    /// Export bucket averages of |power|; bare flag uses the default width.
    #[arg(long, value_name = "MINUTES", num_args = 0..=1, default_missing_value = "10")]
    pub resample_minutes: Option<u32>,

    /// Parser threads; serial when unset.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Tracing filter, e.g. `debug` or `energy_analyser_consolidate=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Rows shown in the preview of the first sheet.
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,
}

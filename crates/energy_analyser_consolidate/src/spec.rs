//! Source models, run options and error types of a consolidation run.

use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::column::{derive_column_label, parse_column_label};
use crate::conf::{
    C_COL_BUCKET_START, C_DELIMITER_DEFAULT, C_FIELD_DATE_DEFAULT, C_FIELD_POWER_DEFAULT,
    C_FIELD_TIME_DEFAULT, C_LABEL_DATE_DEFAULT, C_LABEL_POWER_DEFAULT, C_LABEL_TIME_DEFAULT,
    N_HEADER_ROW_NUMBER_DEFAULT,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Closed set of accepted date layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum EnumTimestampFormat {
    /// Day first, slash separated.
    #[default]
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    /// ISO-like, dash separated.
    #[serde(rename = "YYYY-MM-DD")]
    YearMonthDay,
}

impl EnumTimestampFormat {
    /// Display label as shown to users.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DayMonthYear => "DD/MM/YYYY",
            Self::YearMonthDay => "YYYY-MM-DD",
        }
    }

    /// `chrono` patterns tried in order against `"<date> <time>"`.
    pub fn patterns(self) -> [&'static str; 2] {
        match self {
            Self::DayMonthYear => ["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"],
            Self::YearMonthDay => ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"],
        }
    }
}

impl fmt::Display for EnumTimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumTimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DD/MM/YYYY" => Ok(Self::DayMonthYear),
            "YYYY-MM-DD" => Ok(Self::YearMonthDay),
            other => Err(format!(
                "Unknown timestamp format {other:?}; expected DD/MM/YYYY or YYYY-MM-DD."
            )),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Configuration

/// Output names of the three extracted fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecFieldNames {
    pub date: String,
    pub time: String,
    pub power: String,
}

impl Default for SpecFieldNames {
    fn default() -> Self {
        Self {
            date: C_FIELD_DATE_DEFAULT.to_string(),
            time: C_FIELD_TIME_DEFAULT.to_string(),
            power: C_FIELD_POWER_DEFAULT.to_string(),
        }
    }
}

/// Raw user configuration, before validation.
///
/// Deserializable from a TOML table; missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecSourceConfig {
    /// Spreadsheet-style label of the date column.
    pub date_column_label: String,
    /// Spreadsheet-style label of the time column.
    pub time_column_label: String,
    /// Spreadsheet-style label of the power column.
    pub power_column_label: String,
    /// 1-based row holding the column labels.
    pub header_row_number: usize,
    /// Single ASCII character, or `tab` / `\t`.
    pub delimiter: String,
    /// Layout of the date field.
    pub timestamp_format: EnumTimestampFormat,
    /// Output field names.
    pub field_names: SpecFieldNames,
    /// Bucket width in minutes; `None` exports raw rows.
    pub resample_minutes: Option<u32>,
}

impl Default for SpecSourceConfig {
    fn default() -> Self {
        Self {
            date_column_label: C_LABEL_DATE_DEFAULT.to_string(),
            time_column_label: C_LABEL_TIME_DEFAULT.to_string(),
            power_column_label: C_LABEL_POWER_DEFAULT.to_string(),
            header_row_number: N_HEADER_ROW_NUMBER_DEFAULT,
            delimiter: C_DELIMITER_DEFAULT.to_string(),
            timestamp_format: EnumTimestampFormat::default(),
            field_names: SpecFieldNames::default(),
            resample_minutes: None,
        }
    }
}

/// Resolved, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSource {
    /// Zero-based ordinal of the date column.
    pub col_date: usize,
    /// Zero-based ordinal of the time column.
    pub col_time: usize,
    /// Zero-based ordinal of the power column.
    pub col_power: usize,
    /// Zero-based header row.
    pub header_row: usize,
    pub delimiter: u8,
    pub timestamp_format: EnumTimestampFormat,
    pub fields: SpecFieldNames,
    pub resample_minutes: Option<NonZeroU32>,
}

impl SpecSource {
    /// Validate `config` and resolve it into ordinals.
    ///
    /// Every failure here is fatal to the run.
    pub fn from_config(config: &SpecSourceConfig) -> Result<Self, ConsolidateError> {
        let col_date = parse_column_label(&config.date_column_label)?;
        let col_time = parse_column_label(&config.time_column_label)?;
        let col_power = parse_column_label(&config.power_column_label)?;

        for (a, b) in [(col_date, col_time), (col_date, col_power), (col_time, col_power)] {
            if a == b {
                return Err(ConsolidateError::DuplicateColumn(derive_column_label(a)));
            }
        }

        let header_row = config
            .header_row_number
            .checked_sub(1)
            .ok_or(ConsolidateError::InvalidHeaderRow(config.header_row_number))?;

        let delimiter = parse_delimiter(&config.delimiter)?;
        validate_field_names(&config.field_names)?;

        let resample_minutes = match config.resample_minutes {
            None => None,
            Some(n) => Some(NonZeroU32::new(n).ok_or(ConsolidateError::InvalidResampleWidth)?),
        };

        Ok(Self {
            col_date,
            col_time,
            col_power,
            header_row,
            delimiter,
            timestamp_format: config.timestamp_format,
            fields: config.field_names.clone(),
            resample_minutes,
        })
    }

    /// Largest configured ordinal.
    pub fn col_max(&self) -> usize {
        self.col_date.max(self.col_time).max(self.col_power)
    }
}

fn parse_delimiter(value: &str) -> Result<u8, ConsolidateError> {
    if value == "\t" || value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok(b'\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(chr), None) if chr.is_ascii() && !matches!(chr, '"' | '\r' | '\n') => Ok(chr as u8),
        _ => Err(ConsolidateError::InvalidDelimiter(value.to_string())),
    }
}

fn validate_field_names(fields: &SpecFieldNames) -> Result<(), ConsolidateError> {
    let l_names = [&fields.date, &fields.time, &fields.power];
    if l_names.iter().any(|name| name.trim().is_empty()) {
        return Err(ConsolidateError::InvalidFieldNames(
            "field names must not be empty".to_string(),
        ));
    }
    if fields.date == fields.time || fields.date == fields.power || fields.time == fields.power {
        return Err(ConsolidateError::InvalidFieldNames(
            "field names must be distinct".to_string(),
        ));
    }
    if fields.power == C_COL_BUCKET_START {
        return Err(ConsolidateError::InvalidFieldNames(format!(
            "power field name clashes with {C_COL_BUCKET_START:?}"
        )));
    }
    Ok(())
}

/// Run options that do not change output content.
#[derive(Debug, Clone, Default)]
pub struct SpecConsolidateOptions {
    /// Maximum parser threads; `None` parses serially.
    pub num_workers_max: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sources

/// Where the bytes of one source live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumSourceData {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// One named input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSourceFile {
    /// File name used for the sheet identifier and messages.
    pub name: String,
    pub data: EnumSourceData,
}

impl SpecSourceFile {
    /// Source held in memory, e.g. an upload.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: EnumSourceData::Bytes(data),
        }
    }

    /// Source read lazily from disk; named after its file name.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            data: EnumSourceData::Path(path.to_path_buf()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("Invalid column label {0:?}: expected one or more letters A-Z.")]
    InvalidColumnLabel(String),
    #[error("Column {0} is configured for more than one field.")]
    DuplicateColumn(String),
    #[error("Header row number must be >= 1, got {0}.")]
    InvalidHeaderRow(usize),
    #[error("Invalid delimiter {0:?}: expected a single ASCII character.")]
    InvalidDelimiter(String),
    #[error("Invalid field names: {0}.")]
    InvalidFieldNames(String),
    #[error("Resample width must be at least 1 minute.")]
    InvalidResampleWidth,
    #[error("No data could be processed from the input files.")]
    NoUsableData,
    #[error("Failed to build workbook: {0}")]
    Export(String),
}

/// Errors confined to one source file; the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("{file}: failed to read CSV: {message}")]
    Ingest { file: String, message: String },
    #[error(
        "{file}: column {label} (ordinal {ordinal}) is out of bounds; the file has {available} columns"
    )]
    ColumnOutOfBounds {
        file: String,
        ordinal: usize,
        label: String,
        available: usize,
    },
    #[error("{file}: no valid timestamps for format {format}")]
    NoValidTimestamps {
        file: String,
        format: EnumTimestampFormat,
    },
}

impl FileError {
    /// Name of the failing file.
    pub fn file(&self) -> &str {
        match self {
            Self::Ingest { file, .. }
            | Self::ColumnOutOfBounds { file, .. }
            | Self::NoValidTimestamps { file, .. } => file,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

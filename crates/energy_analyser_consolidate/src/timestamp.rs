//! Date/time fusion and canonical re-emission.

use chrono::NaiveDateTime;

use crate::conf::{C_FMT_DATE_CANONICAL, C_FMT_TIME_CANONICAL};
use crate::model::{RecordTimestamped, TableExtracted};
use crate::spec::{EnumTimestampFormat, FileError};

/// Parse `"<date> <time>"` with the patterns of `format`.
///
/// Returns `None` when either part is absent or no pattern matches.
pub fn parse_timestamp(
    date: Option<&str>,
    time: Option<&str>,
    format: EnumTimestampFormat,
) -> Option<NaiveDateTime> {
    let c_joined = format!("{} {}", date?.trim(), time?.trim());
    format
        .patterns()
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(&c_joined, pattern).ok())
}

/// Parsed rows plus the number of rows dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTimestampOutcome {
    pub records: Vec<RecordTimestamped>,
    pub cnt_dropped: usize,
}

/// Parse every row, drop the unparseable ones and re-emit date/time in
/// `DD/MM/YYYY` and `HH:MM:SS`.
///
/// # Errors
/// [`FileError::NoValidTimestamps`] when no row parses.
pub fn normalize_timestamps(
    table: TableExtracted,
    format: EnumTimestampFormat,
    name_file: &str,
) -> Result<SpecTimestampOutcome, FileError> {
    let n_rows = table.records.len();
    let records: Vec<RecordTimestamped> = table
        .records
        .into_iter()
        .filter_map(|record| {
            let timestamp =
                parse_timestamp(record.date.as_deref(), record.time.as_deref(), format)?;
            Some(RecordTimestamped {
                timestamp,
                date: timestamp.format(C_FMT_DATE_CANONICAL).to_string(),
                time: timestamp.format(C_FMT_TIME_CANONICAL).to_string(),
                power_raw: record.power,
            })
        })
        .collect();

    if records.is_empty() {
        return Err(FileError::NoValidTimestamps {
            file: name_file.to_string(),
            format,
        });
    }

    Ok(SpecTimestampOutcome {
        cnt_dropped: n_rows - records.len(),
        records,
    })
}

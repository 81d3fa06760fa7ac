//! Consolidation constants and defaults.

/// Ceiling on source files per run, enforced by front ends.
pub const N_FILES_INPUT_MAX: usize = 10;

/// Default date column label.
pub const C_LABEL_DATE_DEFAULT: &str = "A";
/// Default time column label.
pub const C_LABEL_TIME_DEFAULT: &str = "B";
/// Default power column label.
pub const C_LABEL_POWER_DEFAULT: &str = "AO";
/// Default 1-based header row number.
pub const N_HEADER_ROW_NUMBER_DEFAULT: usize = 3;
/// Default field delimiter.
pub const C_DELIMITER_DEFAULT: &str = ",";

/// Default output field names.
pub const C_FIELD_DATE_DEFAULT: &str = "Date";
pub const C_FIELD_TIME_DEFAULT: &str = "Time";
pub const C_FIELD_POWER_DEFAULT: &str = "PSum (W)";

/// Bucket width used when resampling is requested without a width.
pub const N_RESAMPLE_MINUTES_DEFAULT: u32 = 10;

/// Canonical output patterns.
pub const C_FMT_DATE_CANONICAL: &str = "%d/%m/%Y";
pub const C_FMT_TIME_CANONICAL: &str = "%H:%M:%S";
pub const C_FMT_BUCKET_CANONICAL: &str = "%d/%m/%Y %H:%M:%S";

/// First column of resampled sheets.
pub const C_COL_BUCKET_START: &str = "Bucket Start";

/// Default workbook file name used by front ends.
pub const C_OUTPUT_FILE_NAME_DEFAULT: &str = "EnergyAnalyser_Consolidated_Data.xlsx";

//! In-memory tables passed between pipeline stages.

use chrono::NaiveDateTime;

use crate::spec::SpecFieldNames;

/// CSV content after the header offset. Selection downstream is positional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRaw {
    /// Header labels, informational only.
    pub labels: Vec<String>,
    /// Data rows; widths may differ.
    pub rows: Vec<Vec<String>>,
}

impl TableRaw {
    /// Column count: the widest of the header and every data row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .fold(self.labels.len(), usize::max)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// The three configured cells of one row; `None` when the row is short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordExtracted {
    pub date: Option<String>,
    pub time: Option<String>,
    pub power: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExtracted {
    pub records: Vec<RecordExtracted>,
}

/// Row that survived timestamp parsing, power still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTimestamped {
    pub timestamp: NaiveDateTime,
    pub date: String,
    pub time: String,
    pub power_raw: Option<String>,
}

/// Fully normalized row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordNormalized {
    /// Parsed instant, kept for bucketing.
    pub timestamp: NaiveDateTime,
    /// `DD/MM/YYYY`.
    pub date: String,
    /// `HH:MM:SS`.
    pub time: String,
    pub power: Option<f64>,
}

/// Normalized rows of one accepted source file.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetNormalized {
    pub sheet_id: String,
    pub name_source: String,
    pub fields: SpecFieldNames,
    pub records: Vec<RecordNormalized>,
}

/// One non-empty time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBucket {
    pub bucket_start: NaiveDateTime,
    /// Mean of absolute power over contributing rows.
    pub power_mean_abs: f64,
    pub cnt_observations: usize,
}

/// Bucketed view of a [`DatasetNormalized`], chronological.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetResampled {
    pub sheet_id: String,
    pub name_source: String,
    pub field_power: String,
    pub minutes_bucket: u32,
    pub buckets: Vec<RecordBucket>,
}

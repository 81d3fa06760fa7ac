//! Registry to in-memory `.xlsx` workbook.

use energy_analyser_io_xlsx::{SpecXlsxSheetWriteOptions, SpecXlsxWriteOptions, XlsxWriter};
use polars::prelude::{Column, DataFrame};
use tracing::debug;

use crate::conf::{C_COL_BUCKET_START, C_FMT_BUCKET_CANONICAL};
use crate::model::{DatasetNormalized, DatasetResampled};
use crate::registry::RegistryDataset;
use crate::spec::ConsolidateError;

/// A dataset that can be laid out as one worksheet.
pub trait SheetFrame {
    /// Columns in output order.
    fn to_frame(&self) -> Result<DataFrame, String>;
    /// Columns written as text cells.
    fn cols_text(&self) -> Vec<String>;
}

impl SheetFrame for DatasetNormalized {
    fn to_frame(&self) -> Result<DataFrame, String> {
        let l_dates: Vec<String> = self.records.iter().map(|r| r.date.clone()).collect();
        let l_times: Vec<String> = self.records.iter().map(|r| r.time.clone()).collect();
        let l_power: Vec<Option<f64>> = self.records.iter().map(|r| r.power).collect();
        DataFrame::new(vec![
            Column::new(self.fields.date.as_str().into(), l_dates),
            Column::new(self.fields.time.as_str().into(), l_times),
            Column::new(self.fields.power.as_str().into(), l_power),
        ])
        .map_err(|err| format!("{}: {err}", self.sheet_id))
    }

    fn cols_text(&self) -> Vec<String> {
        vec![self.fields.date.clone(), self.fields.time.clone()]
    }
}

impl SheetFrame for DatasetResampled {
    fn to_frame(&self) -> Result<DataFrame, String> {
        let l_starts: Vec<String> = self
            .buckets
            .iter()
            .map(|b| b.bucket_start.format(C_FMT_BUCKET_CANONICAL).to_string())
            .collect();
        let l_means: Vec<f64> = self.buckets.iter().map(|b| b.power_mean_abs).collect();
        DataFrame::new(vec![
            Column::new(C_COL_BUCKET_START.into(), l_starts),
            Column::new(self.field_power.as_str().into(), l_means),
        ])
        .map_err(|err| format!("{}: {err}", self.sheet_id))
    }

    fn cols_text(&self) -> Vec<String> {
        vec![C_COL_BUCKET_START.to_string()]
    }
}

/// Serialized workbook and what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputWorkbook {
    pub bytes: Vec<u8>,
    /// Worksheet names in workbook order.
    pub sheet_names: Vec<String>,
    /// Writer warnings, e.g. renamed sheets.
    pub warnings: Vec<String>,
}

/// Write one worksheet per registry entry, in registry order.
///
/// # Errors
/// - [`ConsolidateError::NoUsableData`] on an empty registry.
/// - [`ConsolidateError::Export`] when a sheet cannot be built or written.
pub fn export_workbook<T: SheetFrame>(
    registry: &RegistryDataset<T>,
) -> Result<OutputWorkbook, ConsolidateError> {
    if registry.is_empty() {
        return Err(ConsolidateError::NoUsableData);
    }

    let mut writer = XlsxWriter::with_default_formats(SpecXlsxWriteOptions::default())
        .map_err(ConsolidateError::Export)?;
    for (sheet_id, dataset) in registry.iter() {
        let df = dataset.to_frame().map_err(ConsolidateError::Export)?;
        let options = SpecXlsxSheetWriteOptions {
            cols_text: Some(dataset.cols_text()),
            ..Default::default()
        };
        writer
            .write_sheet_from_dataframe(&df, sheet_id, &options)
            .map_err(ConsolidateError::Export)?;
        debug!(sheet = sheet_id, rows = df.height(), "sheet written");
    }

    let bytes = writer.close().map_err(ConsolidateError::Export)?;
    let warnings = writer
        .report()
        .into_iter()
        .flat_map(|report| report.warnings)
        .collect();
    Ok(OutputWorkbook {
        bytes,
        sheet_names: writer.sheet_names(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use chrono::NaiveDate;

    use super::*;
    use crate::model::RecordBucket;

    fn create_resampled(sheet_id: &str) -> DatasetResampled {
        DatasetResampled {
            sheet_id: sheet_id.to_string(),
            name_source: format!("{sheet_id}.csv"),
            field_power: "PSum (W)".to_string(),
            minutes_bucket: 10,
            buckets: vec![RecordBucket {
                bucket_start: NaiveDate::from_ymd_opt(2024, 3, 5)
                    .unwrap()
                    .and_hms_opt(14, 30, 0)
                    .unwrap(),
                power_mean_abs: 15.0,
                cnt_observations: 2,
            }],
        }
    }

    #[test]
    fn empty_registry_is_no_usable_data() {
        let registry: RegistryDataset<DatasetResampled> = RegistryDataset::new();
        assert!(matches!(
            export_workbook(&registry),
            Err(ConsolidateError::NoUsableData)
        ));
    }

    #[test]
    fn resampled_sheet_has_bucket_column_as_text() {
        let mut registry = RegistryDataset::new();
        registry.insert("meter", create_resampled("meter"));
        let output = export_workbook(&registry).unwrap();
        assert_eq!(output.sheet_names, vec!["meter"]);

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(output.bytes)).unwrap();
        let range = workbook.worksheet_range("meter").unwrap();
        assert_eq!(range.get((0, 0)), Some(&Data::String("Bucket Start".to_string())));
        assert_eq!(
            range.get((1, 0)),
            Some(&Data::String("05/03/2024 14:30:00".to_string()))
        );
        assert_eq!(range.get((1, 1)), Some(&Data::Float(15.0)));
    }
}

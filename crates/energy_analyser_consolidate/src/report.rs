//! Consolidation report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::FileError;

/// Aggregate counters and diagnostics for one consolidation run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReportConsolidate {
    /// Source files handed to the run.
    pub cnt_files_input: u64,
    /// Files that produced a dataset.
    pub cnt_files_accepted: u64,
    /// Files rejected with a [`FileError`].
    pub cnt_files_rejected: u64,
    /// Data rows read below the header, over accepted files.
    pub cnt_rows_raw: u64,
    /// Rows kept after timestamp parsing.
    pub cnt_rows_kept: u64,
    /// Rows dropped for unparseable timestamps.
    pub cnt_rows_dropped: u64,
    /// Kept rows whose power cell is missing.
    pub cnt_power_missing: u64,
    /// Datasets replaced by a later file with the same sheet id.
    pub cnt_sheets_overwritten: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Per-file failures, in input order.
    pub errors: Vec<FileError>,
}

impl ReportConsolidate {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_files_input".to_string(), self.cnt_files_input);
        dict_counts.insert("cnt_files_accepted".to_string(), self.cnt_files_accepted);
        dict_counts.insert("cnt_files_rejected".to_string(), self.cnt_files_rejected);
        dict_counts.insert("cnt_rows_raw".to_string(), self.cnt_rows_raw);
        dict_counts.insert("cnt_rows_kept".to_string(), self.cnt_rows_kept);
        dict_counts.insert("cnt_rows_dropped".to_string(), self.cnt_rows_dropped);
        dict_counts.insert("cnt_power_missing".to_string(), self.cnt_power_missing);
        dict_counts.insert(
            "cnt_sheets_overwritten".to_string(),
            self.cnt_sheets_overwritten,
        );
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} files={} accepted={} rejected={} rows={} kept={} dropped={} missing_power={} overwritten={} errors={} warnings={}",
            self.cnt_files_input,
            self.cnt_files_accepted,
            self.cnt_files_rejected,
            self.cnt_rows_raw,
            self.cnt_rows_kept,
            self.cnt_rows_dropped,
            self.cnt_power_missing,
            self.cnt_sheets_overwritten,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportConsolidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[CONSOLIDATE]"))
    }
}

/// Mutable accumulator owned by the aggregating thread.
#[derive(Debug, Default, Clone)]
pub struct ReportConsolidateBuilder {
    report: ReportConsolidate,
}

impl ReportConsolidateBuilder {
    pub fn new(cnt_files_input: u64) -> Self {
        Self {
            report: ReportConsolidate {
                cnt_files_input,
                ..Default::default()
            },
        }
    }

    /// Record one accepted file.
    pub fn add_accepted(
        &mut self,
        cnt_rows_raw: u64,
        cnt_rows_dropped: u64,
        cnt_power_missing: u64,
    ) {
        let report = &mut self.report;
        report.cnt_files_accepted += 1;
        report.cnt_rows_raw += cnt_rows_raw;
        report.cnt_rows_kept += cnt_rows_raw.saturating_sub(cnt_rows_dropped);
        report.cnt_rows_dropped += cnt_rows_dropped;
        report.cnt_power_missing += cnt_power_missing;
    }

    pub fn add_overwritten(&mut self) {
        self.report.cnt_sheets_overwritten += 1;
    }

    pub fn add_warning(&mut self, warning: String) {
        self.report.warnings.push(warning);
    }

    /// Record one rejected file.
    pub fn add_error(&mut self, error: FileError) {
        self.report.cnt_files_rejected += 1;
        self.report.errors.push(error);
    }

    pub fn build(self) -> ReportConsolidate {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_to_dict_and_format_agree() {
        let mut builder = ReportConsolidateBuilder::new(3);
        builder.add_accepted(10, 2, 1);
        builder.add_accepted(5, 0, 0);
        builder.add_overwritten();
        builder.add_warning("w".to_string());
        builder.add_error(FileError::Ingest {
            file: "bad.csv".to_string(),
            message: "boom".to_string(),
        });
        let report = builder.build();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_files_accepted"], 2);
        assert_eq!(dict_counts["cnt_files_rejected"], 1);
        assert_eq!(dict_counts["cnt_rows_kept"], 13);
        assert_eq!(dict_counts["cnt_errors"], 1);

        let txt = report.format("[CONSOLIDATE]");
        assert_eq!(
            txt,
            "[CONSOLIDATE] files=3 accepted=2 rejected=1 rows=15 kept=13 dropped=2 missing_power=1 overwritten=1 errors=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}

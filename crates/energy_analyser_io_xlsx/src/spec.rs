//! Format, option and report models of the writer kernel.

////////////////////////////////////////////////////////////////////////////////
// #region CellFormat

/// Layerable cell format; `None` means "inherit".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    pub font_name: Option<String>,
    /// Points.
    pub font_size: Option<i64>,
    pub bold: Option<bool>,
    /// `left`, `center`, `right` or `general`.
    pub align: Option<String>,
    /// `top`, `vcenter` or `bottom`.
    pub valign: Option<String>,
    /// Thin border on all four sides.
    pub border: Option<bool>,
    /// Excel number format code, `@` for text.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Copy of `self` with `patch` laid on top.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Field-wise merge; set fields of `other` win.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        fn pick<T: Clone>(over: &Option<T>, base: &Option<T>) -> Option<T> {
            over.clone().or_else(|| base.clone())
        }
        SpecCellFormat {
            font_name: pick(&other.font_name, &self.font_name),
            font_size: pick(&other.font_size, &self.font_size),
            bold: pick(&other.bold, &self.bold),
            align: pick(&other.align, &self.align),
            valign: pick(&other.valign, &self.valign),
            border: pick(&other.border, &self.border),
            num_format: pick(&other.num_format, &self.num_format),
        }
    }
}

/// Cell content after conversion, ready for the worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    None,
    String(String),
    Number(f64),
}

/// How a column is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnKind {
    /// String cells with the `@` format; numbers are stringified.
    Text,
    /// Number cells with the decimal format.
    Decimal,
}

/// Per-column formats and kinds of one sheet slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnFormatPlan {
    pub fmts_by_col: Vec<SpecCellFormat>,
    pub kinds_by_col: Vec<EnumColumnKind>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Placeholders written for missing and non-finite values when they are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    pub missing_value_str: String,
    pub nan_str: String,
    pub posinf_str: String,
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            missing_value_str: "NA".to_string(),
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Source of autofit column widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Leave Excel's default widths.
    None,
    Header,
    Body,
    /// Widest of header and body.
    #[default]
    All,
}

/// Autofit settings of one sheet write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    pub rule_columns: EnumAutofitColumnsRule,
    /// Body rows measured at most; `None` measures all of them.
    pub height_body_inferred_max: Option<usize>,
    pub width_cell_min: usize,
    pub width_cell_max: usize,
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            height_body_inferred_max: Some(2_000),
            width_cell_min: 8,
            width_cell_max: 40,
            width_cell_padding: 2,
        }
    }
}

/// Options shared by every sheet of one writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    pub value_policy: SpecXlsxValuePolicy,
    /// Write placeholders instead of blank cells for missing values.
    pub keep_missing_values: bool,
    /// Numeric dtypes become decimal columns unless listed as text.
    pub infer_numeric_cols: bool,
    /// Patch merged into every body column format.
    pub base_format_patch: SpecCellFormat,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            value_policy: SpecXlsxValuePolicy::default(),
            keep_missing_values: false,
            infer_numeric_cols: true,
            base_format_patch: SpecCellFormat {
                border: Some(false),
                ..Default::default()
            },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Part of a DataFrame emitted as one worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Final, workbook-unique name.
    pub sheet_name: String,
    pub row_start_inclusive: usize,
    pub row_end_exclusive: usize,
    pub col_start_inclusive: usize,
    pub col_end_exclusive: usize,
}

/// Outcome of one `write_sheet_from_dataframe` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    pub sheets: Vec<SpecSheetSlice>,
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_right_side_values() {
        let fmt_base = SpecCellFormat {
            font_name: Some("Calibri".to_string()),
            bold: Some(false),
            num_format: Some("0.000".to_string()),
            ..Default::default()
        };
        let fmt_merged = fmt_base.with_(SpecCellFormat {
            bold: Some(true),
            num_format: Some("@".to_string()),
            ..Default::default()
        });

        assert_eq!(fmt_merged.font_name.as_deref(), Some("Calibri"));
        assert_eq!(fmt_merged.bold, Some(true));
        assert_eq!(fmt_merged.num_format.as_deref(), Some("@"));
        assert_eq!(fmt_merged.border, None);
    }

    #[test]
    fn report_collects_warnings() {
        let mut report = SpecXlsxReport::default();
        report.warn("first");
        report.warn(String::from("second"));
        assert_eq!(report.warnings, vec!["first", "second"]);
    }
}

//! XLSX writer kernel that converts in-memory DataFrames into workbook sheets.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, derive_default_xlsx_formats};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumColumnKind, SpecAutofitCellsPolicy,
    SpecCellFormat, SpecColumnFormatPlan, SpecSheetSlice, SpecXlsxReport, SpecXlsxValuePolicy,
    SpecXlsxWriteOptions,
};
use crate::util::{
    convert_cell_value, plan_sheet_slices, sanitize_sheet_name, select_sorted_indices_from_names,
    validate_unique_columns,
};

/// Per-sheet call options.
#[derive(Default, Debug, Clone)]
pub struct SpecXlsxSheetWriteOptions {
    /// Columns always written as text cells, whatever their dtype.
    pub cols_text: Option<Vec<String>>,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

/// Inputs of [`plan_column_formats`].
pub struct SpecColumnFormatPlanOptions<'a> {
    /// Column role per position.
    pub kinds_by_col: &'a [EnumColumnKind],
    /// Base text format.
    pub fmt_text: &'a SpecCellFormat,
    /// Base decimal format.
    pub fmt_decimal: &'a SpecCellFormat,
    /// Global write options.
    pub write_options: &'a SpecXlsxWriteOptions,
}

/// Stateful in-memory workbook writer.
///
/// Sheets are buffered in memory; [`Self::close`] serializes the workbook and
/// returns the `.xlsx` bytes.
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_decimal: SpecCellFormat,
    fmt_header: SpecCellFormat,
    write_options: SpecXlsxWriteOptions,
    /// Lowercased names; Excel compares sheet names case-insensitively.
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    v_bytes_out: Option<Vec<u8>>,
}

impl XlsxWriter {
    /// Create writer from format/options presets.
    pub fn new(
        fmt_text: SpecCellFormat,
        fmt_decimal: SpecCellFormat,
        fmt_header: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_text,
            fmt_decimal,
            fmt_header,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            v_bytes_out: None,
        }
    }

    /// Create writer with the presets from [`derive_default_xlsx_formats`].
    pub fn with_default_formats(write_options: SpecXlsxWriteOptions) -> Result<Self, String> {
        let dict_fmt = derive_default_xlsx_formats();
        let take_fmt = |key: EnumFmtKey| {
            dict_fmt
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| format!("Missing default format: {}", key.as_str()))
        };

        Ok(Self::new(
            take_fmt(EnumFmtKey::Text)?,
            take_fmt(EnumFmtKey::Decimal)?,
            take_fmt(EnumFmtKey::Header)?,
            write_options,
        ))
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Names of all sheets written so far, in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.l_reports
            .iter()
            .flat_map(|report| report.sheets.iter().map(|s| s.sheet_name.clone()))
            .collect()
    }

    /// Serialize the workbook and return its bytes. Idempotent.
    pub fn close(&mut self) -> Result<Vec<u8>, String> {
        if let Some(v_bytes) = &self.v_bytes_out {
            return Ok(v_bytes.clone());
        }
        let v_bytes = self
            .workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)?;
        self.v_bytes_out = Some(v_bytes.clone());
        Ok(v_bytes)
    }

    /// Write one DataFrame as one sheet (or several, past Excel limits).
    pub fn write_sheet_from_dataframe(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), String> {
        if self.v_bytes_out.is_some() {
            return Err("Cannot write after close().".to_string());
        }
        self.write_sheet(df_data, sheet_name, options)
    }

    fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), String> {
        validate_policy_autofit(&options.policy_autofit)?;

        let if_keep_missing_values = self.write_options.keep_missing_values;
        let value_policy = self.write_options.value_policy.clone();

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df)?;

        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();

        let l_kinds_by_col =
            plan_column_kinds(df_data, &l_colnames_df, options, &self.write_options)?;

        let mut report = SpecXlsxReport::default();
        let n_rows_header = 1;
        let l_sheet_parts = plan_sheet_slices(
            n_height_df,
            n_width_df,
            n_rows_header,
            &sanitize_sheet_name(sheet_name, "_"),
            &mut report,
        )?;

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            if sheet_name_unique != sheet_slice.sheet_name {
                report.warn(format!(
                    "Sheet name {:?} already used; written as {sheet_name_unique:?}.",
                    sheet_slice.sheet_name
                ));
            }
            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;

            let l_kinds_slice =
                &l_kinds_by_col[sheet_slice.col_start_inclusive..sheet_slice.col_end_exclusive];
            let plan_col_formats = plan_column_formats(SpecColumnFormatPlanOptions {
                kinds_by_col: l_kinds_slice,
                fmt_text: &self.fmt_text,
                fmt_decimal: &self.fmt_decimal,
                write_options: &self.write_options,
            });

            let l_fmt_data_by_col: Vec<Format> = plan_col_formats
                .fmts_by_col
                .iter()
                .map(derive_rust_xlsx_format)
                .collect();
            let fmt_header = derive_rust_xlsx_format(&self.fmt_header);

            let l_header_slice =
                &l_colnames_df[sheet_slice.col_start_inclusive..sheet_slice.col_end_exclusive];

            let if_autofit_columns = !matches!(
                options.policy_autofit.rule_columns,
                EnumAutofitColumnsRule::None
            );
            let l_width_by_col_header: Vec<usize> = l_header_slice
                .iter()
                .map(|c_name| estimate_unicode_string_width(c_name))
                .collect();
            let mut l_width_by_col_body = vec![0usize; l_fmt_data_by_col.len()];

            write_header(worksheet, l_header_slice, &fmt_header)?;

            worksheet
                .set_freeze_panes(cast_row_num(n_rows_header)?, 0)
                .map_err(derive_xlsx_error_text)?;

            let n_rows_data_this_sheet =
                sheet_slice.row_end_exclusive - sheet_slice.row_start_inclusive;
            let l_cols_slice = (sheet_slice.col_start_inclusive..sheet_slice.col_end_exclusive)
                .map(|n_idx_col_abs| {
                    df_data.get_columns()[n_idx_col_abs].slice(
                        sheet_slice.row_start_inclusive as i64,
                        n_rows_data_this_sheet,
                    )
                })
                .collect::<Vec<_>>();

            let n_rows_body_inferred_max = options
                .policy_autofit
                .height_body_inferred_max
                .unwrap_or(usize::MAX);
            for n_row_local in 0..n_rows_data_this_sheet {
                let if_measure_row = if_autofit_columns && n_row_local < n_rows_body_inferred_max;
                for (n_idx_col, col) in l_cols_slice.iter().enumerate() {
                    let kind_col = l_kinds_slice[n_idx_col];
                    let value_raw = derive_cell_value_from_any_value(
                        col.get(n_row_local)
                            .map_err(|err| format!("Failed to access cell value: {err}"))?,
                    );
                    let value = convert_cell_value(
                        &value_raw,
                        kind_col,
                        if_keep_missing_values,
                        &value_policy,
                    );

                    if if_measure_row {
                        l_width_by_col_body[n_idx_col] = usize::max(
                            l_width_by_col_body[n_idx_col],
                            estimate_width_len(
                                &value,
                                kind_col,
                                if_keep_missing_values,
                                &value_policy,
                            ),
                        );
                    }

                    write_cell_with_format(
                        worksheet,
                        n_rows_header + n_row_local,
                        n_idx_col,
                        &value,
                        &l_fmt_data_by_col[n_idx_col],
                    )?;
                }
            }

            if if_autofit_columns {
                let n_min = usize::max(1, options.policy_autofit.width_cell_min);
                let n_max = usize::min(
                    255,
                    usize::max(n_min, options.policy_autofit.width_cell_max),
                );
                let n_pad = options.policy_autofit.width_cell_padding;

                for n_idx_col in 0..l_fmt_data_by_col.len() {
                    let n_width_recorded = match options.policy_autofit.rule_columns {
                        EnumAutofitColumnsRule::Header | EnumAutofitColumnsRule::None => {
                            l_width_by_col_header[n_idx_col]
                        }
                        EnumAutofitColumnsRule::Body => l_width_by_col_body[n_idx_col],
                        EnumAutofitColumnsRule::All => usize::max(
                            l_width_by_col_header[n_idx_col],
                            l_width_by_col_body[n_idx_col],
                        ),
                    };
                    let n_width_final =
                        usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
                    worksheet
                        .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                        .map_err(derive_xlsx_error_text)?;
                }
            }

            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                ..sheet_slice
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_lowercase()) {
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if self.set_sheet_names_existing.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Decide the kind of every column: explicit text first, then dtype
/// inference.
pub fn plan_column_kinds(
    df: &DataFrame,
    colnames: &[String],
    options: &SpecXlsxSheetWriteOptions,
    write_options: &SpecXlsxWriteOptions,
) -> Result<Vec<EnumColumnKind>, String> {
    let set_cols_idx_text: BTreeSet<usize> =
        select_sorted_indices_from_names(colnames, options.cols_text.as_deref())?
            .into_iter()
            .collect();

    let l_kinds = df
        .get_columns()
        .iter()
        .enumerate()
        .map(|(n_idx, col)| {
            if set_cols_idx_text.contains(&n_idx) {
                EnumColumnKind::Text
            } else if write_options.infer_numeric_cols && col.dtype().is_numeric() {
                EnumColumnKind::Decimal
            } else {
                EnumColumnKind::Text
            }
        })
        .collect();

    Ok(l_kinds)
}

/// Estimate displayed width units for one normalized cell value.
///
/// Used by autofit inference logic.
pub fn estimate_width_len(
    value: &EnumCellValue,
    kind_col: EnumColumnKind,
    if_keep_missing_values: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> usize {
    match value {
        EnumCellValue::None => {
            if if_keep_missing_values {
                value_policy.missing_value_str.len()
            } else {
                0
            }
        }
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => match kind_col {
            EnumColumnKind::Decimal => format!("{n:.3}").len(),
            EnumColumnKind::Text => estimate_unicode_string_width(&n.to_string()),
        },
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Build per-column final formats for current sheet slice.
pub fn plan_column_formats(options: SpecColumnFormatPlanOptions<'_>) -> SpecColumnFormatPlan {
    let SpecColumnFormatPlanOptions {
        kinds_by_col,
        fmt_text,
        fmt_decimal,
        write_options,
    } = options;

    let fmts_by_col = kinds_by_col
        .iter()
        .map(|kind_col| {
            match kind_col {
                EnumColumnKind::Text => fmt_text,
                EnumColumnKind::Decimal => fmt_decimal,
            }
            .merge(&write_options.base_format_patch)
        })
        .collect();

    SpecColumnFormatPlan {
        fmts_by_col,
        kinds_by_col: kinds_by_col.to_vec(),
    }
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), String> {
    if policy_autofit.width_cell_min == 0 {
        return Err("policy_autofit.width_cell_min must be >= 1.".to_string());
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        );
    }
    Ok(())
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_header(
    worksheet: &mut Worksheet,
    header_row: &[String],
    fmt_header: &Format,
) -> Result<(), String> {
    for (col_idx, cell_value) in header_row.iter().enumerate() {
        if cell_value.is_empty() {
            worksheet
                .write_blank(0, cast_col_num(col_idx)?, fmt_header)
                .map_err(derive_xlsx_error_text)?;
        } else {
            worksheet
                .write_string_with_format(0, cast_col_num(col_idx)?, cell_value, fmt_header)
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if spec.border.unwrap_or(false) {
        format = format.set_border(FormatBorder::Thin);
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use polars::prelude::{Column, DataFrame};

    use super::*;

    fn create_meter_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Date".into(), vec!["05/03/2024", "05/03/2024"]),
            Column::new("Time".into(), vec!["14:30:00", "14:40:00"]),
            Column::new("PSum (W)".into(), vec![Some(123.4), None]),
        ])
        .unwrap()
    }

    fn create_text_options() -> SpecXlsxSheetWriteOptions {
        SpecXlsxSheetWriteOptions {
            cols_text: Some(vec!["Date".to_string(), "Time".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn column_kinds_follow_explicit_text_then_dtype() {
        let df = create_meter_frame();
        let l_colnames: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let l_kinds = plan_column_kinds(
            &df,
            &l_colnames,
            &create_text_options(),
            &SpecXlsxWriteOptions::default(),
        )
        .unwrap();
        assert_eq!(
            l_kinds,
            vec![
                EnumColumnKind::Text,
                EnumColumnKind::Text,
                EnumColumnKind::Decimal
            ]
        );
    }

    #[test]
    fn column_formats_apply_text_number_format() {
        let dict_fmt = derive_default_xlsx_formats();
        let plan = plan_column_formats(SpecColumnFormatPlanOptions {
            kinds_by_col: &[EnumColumnKind::Text, EnumColumnKind::Decimal],
            fmt_text: &dict_fmt["text"],
            fmt_decimal: &dict_fmt["decimal"],
            write_options: &SpecXlsxWriteOptions::default(),
        });
        assert_eq!(plan.fmts_by_col[0].num_format.as_deref(), Some("@"));
        assert_eq!(plan.fmts_by_col[1].num_format.as_deref(), Some("0.000"));
        assert_eq!(plan.fmts_by_col[0].border, Some(false));
    }

    #[test]
    fn written_workbook_keeps_dates_as_text_cells() {
        let mut writer = XlsxWriter::with_default_formats(SpecXlsxWriteOptions::default()).unwrap();
        writer
            .write_sheet_from_dataframe(&create_meter_frame(), "meter_a", &create_text_options())
            .unwrap();
        let v_bytes = writer.close().unwrap();

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(v_bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["meter_a".to_string()]);
        let range = workbook.worksheet_range("meter_a").unwrap();
        assert_eq!(range.get((0, 2)), Some(&Data::String("PSum (W)".to_string())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("05/03/2024".to_string())));
        assert_eq!(range.get((2, 1)), Some(&Data::String("14:40:00".to_string())));
        assert_eq!(range.get((1, 2)), Some(&Data::Float(123.4)));
    }

    #[test]
    fn duplicate_sheet_names_are_suffixed() {
        let mut writer = XlsxWriter::with_default_formats(SpecXlsxWriteOptions::default()).unwrap();
        let df = create_meter_frame();
        let options = create_text_options();
        writer.write_sheet_from_dataframe(&df, "meter", &options).unwrap();
        writer.write_sheet_from_dataframe(&df, "meter", &options).unwrap();

        assert_eq!(writer.sheet_names(), vec!["meter", "meter__2"]);
        let l_reports = writer.report();
        assert!(l_reports[0].warnings.is_empty());
        assert_eq!(l_reports[1].warnings.len(), 1);
    }

    #[test]
    fn sheet_names_differing_only_in_case_are_suffixed() {
        let mut writer = XlsxWriter::with_default_formats(SpecXlsxWriteOptions::default()).unwrap();
        let df = create_meter_frame();
        let options = create_text_options();
        for name in ["Meter", "meter", "METER__2"] {
            writer.write_sheet_from_dataframe(&df, name, &options).unwrap();
        }
        assert_eq!(writer.sheet_names(), vec!["Meter", "meter__2", "METER__2__2"]);

        let v_bytes = writer.close().unwrap();
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(v_bytes)).unwrap();
        assert_eq!(workbook.sheet_names().len(), 3);
    }

    #[test]
    fn close_is_idempotent_and_blocks_further_writes() {
        let mut writer = XlsxWriter::with_default_formats(SpecXlsxWriteOptions::default()).unwrap();
        writer
            .write_sheet_from_dataframe(&create_meter_frame(), "meter", &create_text_options())
            .unwrap();
        let v_first = writer.close().unwrap();
        let v_second = writer.close().unwrap();
        assert_eq!(v_first, v_second);
        assert!(
            writer
                .write_sheet_from_dataframe(&create_meter_frame(), "late", &create_text_options())
                .is_err()
        );
    }

    #[test]
    fn unknown_text_column_is_an_error() {
        let mut writer = XlsxWriter::with_default_formats(SpecXlsxWriteOptions::default()).unwrap();
        let options = SpecXlsxSheetWriteOptions {
            cols_text: Some(vec!["Timestamp".to_string()]),
            ..Default::default()
        };
        let err = writer
            .write_sheet_from_dataframe(&create_meter_frame(), "meter", &options)
            .unwrap_err();
        assert!(err.contains("Timestamp"), "{err}");
    }
}

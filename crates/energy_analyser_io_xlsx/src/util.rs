//! Pure helpers of the writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    C_EXCEL_SHEET_NAME_RESERVED, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{
    EnumCellValue, EnumColumnKind, SpecSheetSlice, SpecXlsxReport, SpecXlsxValuePolicy,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Placeholder text of a NaN or infinite value.
pub fn convert_non_finite_to_str(x: f64, value_policy: &SpecXlsxValuePolicy) -> String {
    if x.is_nan() {
        value_policy.nan_str.clone()
    } else if x.is_sign_positive() {
        value_policy.posinf_str.clone()
    } else {
        value_policy.neginf_str.clone()
    }
}

/// Convert one cell for a column of kind `kind_col`.
///
/// Text columns never yield numbers, so a value like `05/03/2024` cannot be
/// reinterpreted by the spreadsheet. Missing and non-finite values become
/// blanks, or placeholders when `if_keep_missing_values` is set.
pub fn convert_cell_value(
    value: &EnumCellValue,
    kind_col: EnumColumnKind,
    if_keep_missing_values: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> EnumCellValue {
    let convert_missing = |c_placeholder: String| {
        if if_keep_missing_values {
            EnumCellValue::String(c_placeholder)
        } else {
            EnumCellValue::None
        }
    };

    match (kind_col, value) {
        (_, EnumCellValue::None) => convert_missing(value_policy.missing_value_str.clone()),
        (EnumColumnKind::Text, EnumCellValue::String(s)) => EnumCellValue::String(s.clone()),
        (EnumColumnKind::Text, EnumCellValue::Number(n)) => EnumCellValue::String(n.to_string()),
        (EnumColumnKind::Decimal, EnumCellValue::Number(n)) if n.is_finite() => {
            EnumCellValue::Number(*n)
        }
        (EnumColumnKind::Decimal, EnumCellValue::Number(n)) => {
            convert_missing(convert_non_finite_to_str(*n, value_policy))
        }
        (EnumColumnKind::Decimal, EnumCellValue::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => EnumCellValue::Number(v),
            Ok(v) => convert_missing(convert_non_finite_to_str(v, value_policy)),
            Err(_) => EnumCellValue::String(s.clone()),
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {:?}", l_pos.len(), l_pos))
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Resolve column names to sorted unique indices.
pub fn select_sorted_indices_from_names(
    columns: &[String],
    names: Option<&[String]>,
) -> Result<Vec<usize>, String> {
    let Some(names) = names else {
        return Ok(vec![]);
    };

    let mut set_idx = BTreeSet::new();
    for c_name_ref in names {
        let Some(n_idx) = columns.iter().position(|c_name| c_name == c_name_ref) else {
            return Err(format!("Column not found: {c_name_ref:?}"));
        };
        set_idx.insert(n_idx);
    }

    Ok(set_idx.into_iter().collect())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
///
/// Edge apostrophes and whitespace are stripped before and after the length
/// cap. A blank result becomes `Sheet`; the reserved `History` gets a `_`.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    let c_capped: String = strip_sheet_name_edges(&c_name)
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect();
    let c_name = strip_sheet_name_edges(&c_capped);

    if c_name.is_empty() {
        "Sheet".to_string()
    } else if c_name.eq_ignore_ascii_case(C_EXCEL_SHEET_NAME_RESERVED) {
        format!("{c_name}_")
    } else {
        c_name.to_string()
    }
}

fn strip_sheet_name_edges(name: &str) -> &str {
    name.trim_matches(|chr: char| chr == '\'' || chr.is_whitespace())
}

/// Split logical dataframe range into Excel-compliant sheet slices.
pub fn plan_sheet_slices(
    height_df: usize,
    width_df: usize,
    height_header: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<Vec<SpecSheetSlice>, String> {
    if height_header == 0 {
        return Err("height_header must be >= 1.".to_string());
    }

    let n_rows_data_max = N_NROWS_EXCEL_MAX
        .checked_sub(height_header)
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            format!("Header too tall: height_header={height_header} exceeds Excel limit.")
        })?;

    let mut l_col_slices = Vec::new();
    let mut n_col_start = 0;
    while n_col_start < width_df {
        let n_col_end = usize::min(width_df, n_col_start + N_NCOLS_EXCEL_MAX);
        l_col_slices.push((n_col_start, n_col_end));
        n_col_start = n_col_end;
    }

    let mut l_row_slices = Vec::new();
    let mut n_row_start = 0;
    while n_row_start < height_df {
        let n_row_end = usize::min(height_df, n_row_start + n_rows_data_max);
        l_row_slices.push((n_row_start, n_row_end));
        n_row_start = n_row_end;
    }

    if l_row_slices.is_empty() {
        l_row_slices.push((0, 0));
    }

    let n_parts_total = l_col_slices.len() * l_row_slices.len();

    let mut l_sheet_parts = Vec::new();
    let mut n_idx_part = 1;
    for (col_start, col_end) in &l_col_slices {
        for (row_start, row_end) in &l_row_slices {
            let c_part_sheet_name = if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx_part)
            };

            l_sheet_parts.push(SpecSheetSlice {
                sheet_name: c_part_sheet_name,
                row_start_inclusive: *row_start,
                row_end_exclusive: *row_end,
                col_start_inclusive: *col_start,
                col_end_exclusive: *col_end,
            });
            n_idx_part += 1;
        }
    }

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel limit overflow: {sheet_name:?} split into {} sheets (columns-first, then rows).",
            l_sheet_parts.len()
        ));
    }

    Ok(l_sheet_parts)
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_columns_keep_date_like_strings_as_text() {
        let policy = SpecXlsxValuePolicy::default();
        let value = convert_cell_value(
            &EnumCellValue::String("05/03/2024".to_string()),
            EnumColumnKind::Text,
            false,
            &policy,
        );
        assert_eq!(value, EnumCellValue::String("05/03/2024".to_string()));

        let value = convert_cell_value(
            &EnumCellValue::Number(14.0),
            EnumColumnKind::Text,
            false,
            &policy,
        );
        assert_eq!(value, EnumCellValue::String("14".to_string()));
    }

    #[test]
    fn decimal_columns_blank_or_label_non_finite_values() {
        let policy = SpecXlsxValuePolicy::default();
        assert_eq!(
            convert_cell_value(
                &EnumCellValue::Number(f64::NAN),
                EnumColumnKind::Decimal,
                false,
                &policy
            ),
            EnumCellValue::None
        );
        assert_eq!(
            convert_cell_value(
                &EnumCellValue::Number(f64::NEG_INFINITY),
                EnumColumnKind::Decimal,
                true,
                &policy
            ),
            EnumCellValue::String("-Inf".to_string())
        );
        assert_eq!(
            convert_cell_value(&EnumCellValue::None, EnumColumnKind::Decimal, true, &policy),
            EnumCellValue::String("NA".to_string())
        );
        assert_eq!(
            convert_cell_value(
                &EnumCellValue::String("123.4".to_string()),
                EnumColumnKind::Decimal,
                false,
                &policy
            ),
            EnumCellValue::Number(123.4)
        );
    }

    #[test]
    fn duplicate_columns_are_reported_with_positions() {
        let columns = vec!["Date".to_string(), "Time".to_string(), "Date".to_string()];
        let err = validate_unique_columns(&columns).unwrap_err();
        assert!(err.contains("\"Date\" x2 at indices [0, 2]"), "{err}");
        assert!(validate_unique_columns(&columns[..2]).is_ok());
    }

    #[test]
    fn names_resolve_to_sorted_indices() {
        let columns = vec!["Date".to_string(), "Time".to_string(), "PSum (W)".to_string()];
        let names = vec!["Time".to_string(), "Date".to_string()];
        assert_eq!(
            select_sorted_indices_from_names(&columns, Some(names.as_slice())).unwrap(),
            vec![0, 1]
        );
        assert!(select_sorted_indices_from_names(&columns, None).unwrap().is_empty());
        let names_missing = vec!["Power".to_string()];
        assert!(
            select_sorted_indices_from_names(&columns, Some(names_missing.as_slice())).is_err()
        );
    }

    #[test]
    fn sheet_names_are_sanitized_and_capped() {
        assert_eq!(sanitize_sheet_name("meter[1]/east", "_"), "meter_1__east");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        let c_long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&c_long, "_").chars().count(), 31);
    }

    #[test]
    fn sheet_names_lose_edge_apostrophes() {
        assert_eq!(sanitize_sheet_name("'quoted'", "_"), "quoted");
        assert_eq!(sanitize_sheet_name(" ' meter's ' ", "_"), "meter's");
        assert_eq!(sanitize_sheet_name("''", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name("history", "_"), "history_");

        // Cap lands right after an apostrophe followed by a space.
        let c_cut = format!("{}' tail", "m".repeat(29));
        assert_eq!(sanitize_sheet_name(&c_cut, "_"), "m".repeat(29));
    }

    #[test]
    fn tall_tables_split_into_suffixed_sheets() {
        let mut report = SpecXlsxReport::default();
        let l_parts =
            plan_sheet_slices(N_NROWS_EXCEL_MAX + 10, 3, 1, "meter", &mut report).unwrap();
        assert_eq!(l_parts.len(), 2);
        assert_eq!(l_parts[0].sheet_name, "meter_1");
        assert_eq!(l_parts[0].row_end_exclusive, N_NROWS_EXCEL_MAX - 1);
        assert_eq!(l_parts[1].sheet_name, "meter_2");
        assert_eq!(l_parts[1].row_end_exclusive, N_NROWS_EXCEL_MAX + 10);
        assert_eq!(report.warnings.len(), 1);

        let mut report = SpecXlsxReport::default();
        let l_parts = plan_sheet_slices(0, 3, 1, "empty", &mut report).unwrap();
        assert_eq!(l_parts.len(), 1);
        assert_eq!(l_parts[0].sheet_name, "empty");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn sheet_identifier_suffix_respects_length_cap() {
        let c_name = create_sheet_identifier(&"a".repeat(31), 12);
        assert_eq!(c_name.chars().count(), 31);
        assert!(c_name.ends_with("_12"));
    }
}

//! Positional projection of the date, time and power columns.

use crate::column::derive_column_label;
use crate::model::{RecordExtracted, TableExtracted, TableRaw};
use crate::spec::{FileError, SpecSource};

/// Project the configured ordinals, in (date, time, power) order.
///
/// # Errors
/// [`FileError::ColumnOutOfBounds`] when the table is narrower than the
/// largest configured ordinal; nothing is returned for that file.
pub fn extract_fields(
    table: &TableRaw,
    spec: &SpecSource,
    name_file: &str,
) -> Result<TableExtracted, FileError> {
    let n_width = table.width();
    let n_col_max = spec.col_max();
    if n_width <= n_col_max {
        return Err(FileError::ColumnOutOfBounds {
            file: name_file.to_string(),
            ordinal: n_col_max,
            label: derive_column_label(n_col_max),
            available: n_width,
        });
    }

    let records = table
        .rows
        .iter()
        .map(|row| RecordExtracted {
            date: row.get(spec.col_date).cloned(),
            time: row.get(spec.col_time).cloned(),
            power: row.get(spec.col_power).cloned(),
        })
        .collect();

    Ok(TableExtracted { records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecSourceConfig;

    fn create_spec(power: &str) -> SpecSource {
        SpecSource::from_config(&SpecSourceConfig {
            date_column_label: "C".to_string(),
            time_column_label: "A".to_string(),
            power_column_label: power.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn create_table() -> TableRaw {
        TableRaw {
            labels: vec!["t".into(), "x".into(), "d".into(), "p".into()],
            rows: vec![
                vec!["10:00".into(), "x".into(), "01/01/2024".into(), "7".into()],
                vec!["11:00".into(), "x".into(), "01/01/2024".into()],
            ],
        }
    }

    #[test]
    fn projects_in_fixed_order() {
        let table = extract_fields(&create_table(), &create_spec("D"), "f.csv").unwrap();
        assert_eq!(
            table.records[0],
            RecordExtracted {
                date: Some("01/01/2024".into()),
                time: Some("10:00".into()),
                power: Some("7".into()),
            }
        );
        assert_eq!(table.records[1].power, None);
    }

    #[test]
    fn narrow_table_reports_largest_ordinal() {
        let err = extract_fields(&create_table(), &create_spec("BI"), "f.csv").unwrap_err();
        assert_eq!(
            err,
            FileError::ColumnOutOfBounds {
                file: "f.csv".to_string(),
                ordinal: 60,
                label: "BI".to_string(),
                available: 4,
            }
        );
    }
}

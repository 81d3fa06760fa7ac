//! Per-cell numeric coercion of the power field.

use crate::model::{RecordNormalized, RecordTimestamped};

/// Parse one power cell; anything that is not a finite number is missing.
pub fn parse_power(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Coerce every row; returns the records and the count of missing cells.
pub fn sanitize_power(records: Vec<RecordTimestamped>) -> (Vec<RecordNormalized>, usize) {
    let mut cnt_missing = 0usize;
    let l_records = records
        .into_iter()
        .map(|record| {
            let power = parse_power(record.power_raw.as_deref());
            if power.is_none() {
                cnt_missing += 1;
            }
            RecordNormalized {
                timestamp: record.timestamp,
                date: record.date,
                time: record.time,
                power,
            }
        })
        .collect();
    (l_records, cnt_missing)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn numeric_tokens_parse() {
        assert_eq!(parse_power(Some("abc")), None);
        assert_eq!(parse_power(Some("123.4")), Some(123.4));
        assert_eq!(parse_power(Some("-5")), Some(-5.0));
        assert_eq!(parse_power(Some(" 7 ")), Some(7.0));
    }

    #[test]
    fn empty_absent_and_non_finite_are_missing() {
        for token in ["", "  ", "NaN", "inf", "-infinity"] {
            assert_eq!(parse_power(Some(token)), None, "{token:?}");
        }
        assert_eq!(parse_power(None), None);
    }

    #[test]
    fn sanitize_keeps_every_row() {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let create = |raw: Option<&str>| RecordTimestamped {
            timestamp,
            date: "05/03/2024".to_string(),
            time: "14:30:00".to_string(),
            power_raw: raw.map(ToString::to_string),
        };
        let (records, cnt_missing) =
            sanitize_power(vec![create(Some("1.5")), create(Some("x")), create(None)]);
        assert_eq!(records.len(), 3);
        assert_eq!(cnt_missing, 2);
        assert_eq!(records[0].power, Some(1.5));
    }
}

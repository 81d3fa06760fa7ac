//! Fixed-width time bucketing of absolute power.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use chrono::{DateTime, NaiveDateTime};

use crate::model::{DatasetNormalized, DatasetResampled, RecordBucket};

/// Start of the epoch-aligned bucket that contains `timestamp`.
pub fn derive_bucket_start(
    timestamp: NaiveDateTime,
    minutes_bucket: NonZeroU32,
) -> Option<NaiveDateTime> {
    let n_width_secs = i64::from(minutes_bucket.get()) * 60;
    let n_secs = timestamp.and_utc().timestamp();
    let n_start = n_secs.div_euclid(n_width_secs) * n_width_secs;
    DateTime::from_timestamp(n_start, 0).map(|dt| dt.naive_utc())
}

/// Mean of `|power|` per half-open bucket.
///
/// Rows with missing power do not contribute; buckets without any
/// contribution are omitted. Output is chronological.
pub fn resample_dataset(
    dataset: &DatasetNormalized,
    minutes_bucket: NonZeroU32,
) -> DatasetResampled {
    let mut dict_buckets: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for record in &dataset.records {
        let Some(power) = record.power else {
            continue;
        };
        let Some(bucket_start) = derive_bucket_start(record.timestamp, minutes_bucket) else {
            continue;
        };
        let entry = dict_buckets.entry(bucket_start).or_insert((0.0, 0));
        entry.0 += power.abs();
        entry.1 += 1;
    }

    DatasetResampled {
        sheet_id: dataset.sheet_id.clone(),
        name_source: dataset.name_source.clone(),
        field_power: dataset.fields.power.clone(),
        minutes_bucket: minutes_bucket.get(),
        buckets: dict_buckets
            .into_iter()
            .map(|(bucket_start, (n_sum, cnt))| RecordBucket {
                bucket_start,
                power_mean_abs: n_sum / cnt as f64,
                cnt_observations: cnt,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::RecordNormalized;
    use crate::spec::SpecFieldNames;

    fn create_ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn create_dataset(l_points: &[(NaiveDateTime, Option<f64>)]) -> DatasetNormalized {
        DatasetNormalized {
            sheet_id: "m".to_string(),
            name_source: "m.csv".to_string(),
            fields: SpecFieldNames::default(),
            records: l_points
                .iter()
                .map(|(timestamp, power)| RecordNormalized {
                    timestamp: *timestamp,
                    date: String::new(),
                    time: String::new(),
                    power: *power,
                })
                .collect(),
        }
    }

    fn ten_minutes() -> NonZeroU32 {
        NonZeroU32::new(10).unwrap()
    }

    #[test]
    fn mean_of_absolute_values() {
        let dataset = create_dataset(&[
            (create_ts(14, 31, 0), Some(-10.0)),
            (create_ts(14, 39, 59), Some(20.0)),
        ]);
        let resampled = resample_dataset(&dataset, ten_minutes());
        assert_eq!(resampled.buckets.len(), 1);
        assert_eq!(resampled.buckets[0].bucket_start, create_ts(14, 30, 0));
        assert_eq!(resampled.buckets[0].power_mean_abs, 15.0);
        assert_eq!(resampled.buckets[0].cnt_observations, 2);
    }

    #[test]
    fn empty_and_missing_only_buckets_are_omitted() {
        let dataset = create_dataset(&[
            (create_ts(14, 55, 0), Some(4.0)),
            (create_ts(14, 20, 0), Some(2.0)),
            (create_ts(14, 30, 0), None),
        ]);
        let resampled = resample_dataset(&dataset, ten_minutes());
        let l_starts: Vec<_> = resampled.buckets.iter().map(|b| b.bucket_start).collect();
        assert_eq!(l_starts, vec![create_ts(14, 20, 0), create_ts(14, 50, 0)]);
    }

    #[test]
    fn bucket_boundaries_are_half_open() {
        let width = ten_minutes();
        assert_eq!(
            derive_bucket_start(create_ts(14, 40, 0), width),
            Some(create_ts(14, 40, 0))
        );
        assert_eq!(
            derive_bucket_start(create_ts(14, 39, 59), width),
            Some(create_ts(14, 30, 0))
        );
    }

    #[test]
    fn pre_epoch_timestamps_floor_downwards() {
        let ts = NaiveDate::from_ymd_opt(1969, 12, 31)
            .unwrap()
            .and_hms_opt(23, 55, 0)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(1969, 12, 31)
            .unwrap()
            .and_hms_opt(23, 50, 0)
            .unwrap();
        assert_eq!(derive_bucket_start(ts, ten_minutes()), Some(expected));
    }

    #[test]
    fn resampling_is_idempotent() {
        let dataset = create_dataset(&[(create_ts(1, 2, 3), Some(-1.5))]);
        assert_eq!(
            resample_dataset(&dataset, ten_minutes()),
            resample_dataset(&dataset, ten_minutes())
        );
    }
}

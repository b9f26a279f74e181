//! Weekly aggregation.
//!
//! Weeks are ISO weeks: a record belongs to the week starting on the Monday on
//! or before its date. Weeks without records are absent from the output.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::domain::{NormalizedRecord, Series, WeeklyPoint};

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Group records by week and compute the per-week mean and sample count.
///
/// The result does not depend on input order: each week's values are summed in
/// sorted order, so the floating-point mean is bit-identical however the
/// records were shuffled.
pub fn aggregate<I>(records: I) -> Series
where
    I: IntoIterator<Item = NormalizedRecord>,
{
    let mut weeks: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for record in records {
        weeks.entry(week_start(record.date)).or_default().push(record.value);
    }

    let points: Vec<WeeklyPoint> = weeks
        .into_iter()
        .map(|(week_start, mut values)| {
            values.sort_by(f64::total_cmp);
            let sum: f64 = values.iter().sum();
            WeeklyPoint {
                week_start,
                mean_value: sum / values.len() as f64,
                sample_count: values.len(),
            }
        })
        .collect();

    debug!(weeks = points.len(), "aggregated weekly points");
    Series::from_sorted(points)
}

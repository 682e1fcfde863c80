//! Calendar-complete daily series over a trailing window.
//!
//! Aggregators produce partial per-day totals aligned to the window's
//! date keys; the merger sums them into the combined series the
//! dashboard charts, keeping the per-source breakdown for the stacked
//! view. Amounts are integer KRW, so merged totals equal the sum of
//! their parts exactly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::time_window::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: String,
    pub value: i64,
}

/// Bucket `(instant, value)` pairs into per-day totals aligned to the
/// window. Instants outside the window (and rows whose timestamp failed
/// to parse) contribute nothing; days with no activity stay zero.
pub fn bucket_daily<I>(window: &TimeWindow, entries: I) -> Vec<i64>
where
    I: IntoIterator<Item = (Option<DateTime<Utc>>, i64)>,
{
    let mut values = vec![0_i64; window.days as usize];
    for (instant, value) in entries {
        let Some(index) = instant.and_then(|at| window.day_index(at)) else {
            continue;
        };
        values[index] += value;
    }
    values
}

/// Sum per-source series into one combined series. Every source must
/// already be aligned to the same window; a length mismatch is an
/// implementation bug, not runtime data.
pub fn merge(window: &TimeWindow, sources: &[&[i64]]) -> Vec<i64> {
    let mut merged = vec![0_i64; window.days as usize];
    for source in sources {
        debug_assert_eq!(
            source.len(),
            merged.len(),
            "source series is not aligned to the window"
        );
        for (slot, value) in merged.iter_mut().zip(source.iter()) {
            *slot += value;
        }
    }
    merged
}

pub fn to_points(window: &TimeWindow, values: &[i64]) -> Vec<SeriesPoint> {
    window
        .date_keys
        .iter()
        .zip(values.iter())
        .map(|(date, value)| SeriesPoint {
            date: date.clone(),
            value: *value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::super::time_window::trailing_window;
    use super::{bucket_daily, merge, to_points};

    fn utc(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("valid RFC 3339 instant")
    }

    #[test]
    fn buckets_by_local_calendar_day() {
        let window = trailing_window(utc("2026-08-07T03:30:00Z"), 7);
        let values = bucket_daily(
            &window,
            vec![
                // 16:30 UTC on the 6th is already Aug 7 locally.
                (Some(utc("2026-08-06T16:30:00Z")), 10_000),
                (Some(utc("2026-08-01T01:00:00Z")), 20_000),
                (Some(utc("2026-08-01T05:00:00Z")), 5_000),
                // Outside the window.
                (Some(utc("2026-07-20T01:00:00Z")), 99_999),
                // Unparseable timestamp upstream.
                (None, 99_999),
            ],
        );
        assert_eq!(values, vec![25_000, 0, 0, 0, 0, 0, 10_000]);
    }

    #[test]
    fn merged_total_equals_sum_of_sources_exactly() {
        let window = trailing_window(utc("2026-08-07T03:30:00Z"), 5);
        let orders = vec![10_000, 0, 3_000, 0, 7_500];
        let rentals = vec![0, 18_000, 0, 0, 500];
        let packages = vec![1, 2, 3, 4, 5];

        let merged = merge(&window, &[&orders, &rentals, &packages]);
        for day in 0..window.days as usize {
            assert_eq!(merged[day], orders[day] + rentals[day] + packages[day]);
        }
    }

    #[test]
    fn points_carry_the_window_dates_in_order() {
        let window = trailing_window(utc("2026-08-07T03:30:00Z"), 3);
        let points = to_points(&window, &[1, 2, 3]);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, "2026-08-05");
        assert_eq!(points[2].date, "2026-08-07");
        assert_eq!(points[2].value, 3);
    }
}

//! Calendar-window arithmetic under the storefront's fixed local offset.
//!
//! All admin reporting is anchored to KST, a constant UTC+9 shift. Day
//! and month boundaries are computed on local calendar dates and only
//! then converted back to UTC instants, so a boundary is always a whole
//! local midnight and never drifts by partial hours.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

pub const LOCAL_OFFSET_HOURS: i32 = 9;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_HOURS * 3600).expect("valid fixed offset")
}

/// The local calendar date containing `instant`.
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&local_offset()).date_naive()
}

/// The UTC instant of local midnight at the start of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    local_offset()
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .expect("fixed offsets map local times unambiguously")
        .with_timezone(&Utc)
}

/// The UTC instant of local midnight on the 1st of the month containing
/// `instant`.
pub fn month_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let date = local_date(instant);
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    day_start(first)
}

/// `YYYY-MM` key of the local month containing `instant`.
pub fn month_key(instant: DateTime<Utc>) -> String {
    let date = local_date(instant);
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Shift a `YYYY-MM` key by whole months, wrapping years ("2026-01"
/// minus one month is "2025-12"). Unparseable keys are returned as-is.
pub fn shift_month_key(key: &str, delta_months: i32) -> String {
    let Some((year_raw, month_raw)) = key.trim().split_once('-') else {
        return key.to_string();
    };
    let (Ok(year), Ok(month)) = (year_raw.parse::<i32>(), month_raw.parse::<i32>()) else {
        return key.to_string();
    };
    if !(1..=12).contains(&month) {
        return key.to_string();
    }

    let total = year * 12 + (month - 1) + delta_months;
    format!("{:04}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub days: u32,
    /// UTC instant of local midnight on the first day of the window.
    pub start: DateTime<Utc>,
    /// The captured `now`; the window covers (start ..= end].
    pub end: DateTime<Utc>,
    /// Ascending `%Y-%m-%d` local calendar-day keys, one per day.
    pub date_keys: Vec<String>,
}

impl TimeWindow {
    pub fn first_date(&self) -> NaiveDate {
        local_date(self.start)
    }

    /// Index of the local calendar day containing `instant`, if it
    /// falls inside the window.
    pub fn day_index(&self, instant: DateTime<Utc>) -> Option<usize> {
        let offset = (local_date(instant) - self.first_date()).num_days();
        if offset < 0 || offset >= i64::from(self.days) {
            return None;
        }
        Some(offset as usize)
    }
}

/// The trailing window of `days` consecutive local calendar days ending
/// on the day containing `end`.
pub fn trailing_window(end: DateTime<Utc>, days: u32) -> TimeWindow {
    let days = days.max(1);
    let last = local_date(end);
    let first = last
        .checked_sub_days(Days::new(u64::from(days) - 1))
        .unwrap_or(last);

    let mut date_keys = Vec::with_capacity(days as usize);
    let mut cursor = first;
    for _ in 0..days {
        date_keys.push(cursor.format(DATE_KEY_FORMAT).to_string());
        cursor = cursor.checked_add_days(Days::new(1)).unwrap_or(cursor);
    }

    TimeWindow {
        days,
        start: day_start(first),
        end,
        date_keys,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::{day_start, local_date, month_key, month_start, shift_month_key, trailing_window};

    fn utc(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("valid RFC 3339 instant")
    }

    #[test]
    fn window_is_calendar_complete() {
        let window = trailing_window(utc("2026-08-07T03:30:00Z"), 7);
        assert_eq!(window.days, 7);
        assert_eq!(window.date_keys.len(), 7);
        for pair in window.date_keys.windows(2) {
            assert!(pair[0] < pair[1], "keys must strictly increase: {pair:?}");
        }
        assert_eq!(window.date_keys.first().map(String::as_str), Some("2026-08-01"));
        assert_eq!(window.date_keys.last().map(String::as_str), Some("2026-08-07"));
    }

    #[test]
    fn local_day_rolls_over_before_utc() {
        // 16:00 UTC is already the next local day under UTC+9.
        assert_eq!(
            local_date(utc("2026-03-31T16:00:00Z")).to_string(),
            "2026-04-01"
        );
        let window = trailing_window(utc("2026-03-31T16:00:00Z"), 3);
        assert_eq!(
            window.date_keys,
            vec!["2026-03-30", "2026-03-31", "2026-04-01"]
        );
    }

    #[test]
    fn day_boundaries_are_whole_local_midnights() {
        let date = local_date(utc("2026-08-07T03:30:00Z"));
        let boundary = day_start(date);
        // Local midnight on 2026-08-07 is 15:00 UTC the previous day.
        assert_eq!(boundary, utc("2026-08-06T15:00:00Z"));
    }

    #[test]
    fn window_spans_month_edges_without_gaps() {
        let window = trailing_window(utc("2026-03-02T01:00:00Z"), 5);
        assert_eq!(
            window.date_keys,
            vec![
                "2026-02-26",
                "2026-02-27",
                "2026-02-28",
                "2026-03-01",
                "2026-03-02"
            ]
        );
        assert_eq!(window.start, day_start(window.first_date()));
    }

    #[test]
    fn day_index_covers_exactly_the_window() {
        let now = utc("2026-08-07T03:30:00Z");
        let window = trailing_window(now, 7);
        assert_eq!(window.day_index(now), Some(6));
        assert_eq!(window.day_index(utc("2026-08-01T00:00:00Z")), Some(0));
        // Before the first local midnight of the window.
        assert_eq!(window.day_index(utc("2026-07-31T14:59:59Z")), None);
        assert_eq!(window.day_index(utc("2026-07-31T15:00:00Z")), Some(0));
    }

    #[test]
    fn month_start_is_the_first_local_midnight() {
        let start = month_start(utc("2026-08-07T03:30:00Z"));
        assert_eq!(start, utc("2026-07-31T15:00:00Z"));
        assert_eq!(month_key(utc("2026-08-07T03:30:00Z")), "2026-08");
    }

    #[test]
    fn month_keys_wrap_years() {
        assert_eq!(shift_month_key("2026-01", -1), "2025-12");
        assert_eq!(shift_month_key("2025-12", 1), "2026-01");
        assert_eq!(shift_month_key("2026-08", -14), "2025-06");
        assert_eq!(shift_month_key("garbage", -1), "garbage");
    }
}

//! One captured instant, every derived threshold.
//!
//! The snapshot assembler builds this once and passes it to every
//! aggregator; no component re-reads the system clock, so all widgets
//! observe the same "now".

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};

use super::time_window::{self, TimeWindow};

pub const TRAILING_WINDOW_DAYS: u32 = 7;
pub const PAYMENT_PENDING_AGE_HOURS: i64 = 24;
pub const RENTAL_DUE_SOON_HOURS: i64 = 48;
pub const AGING_APPLICATION_HOURS: i64 = 72;
pub const PASS_EXPIRY_WINDOW_DAYS: u64 = 30;
/// Queue candidates older than this are assumed resolved elsewhere;
/// the lookback bounds queue queries on unbounded tables.
pub const QUEUE_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct MetricsContext {
    pub now: DateTime<Utc>,
    /// Local calendar day containing `now`.
    pub today: NaiveDate,
    /// Trailing 7-day window ending today.
    pub window: TimeWindow,
    /// Local midnight on the 1st of the current month, for the
    /// status-distribution lookback.
    pub month_start: DateTime<Utc>,
    pub month_key: String,
    pub payment_pending_before: DateTime<Utc>,
    pub aging_application_before: DateTime<Utc>,
    pub rental_due_soon_until: DateTime<Utc>,
    pub pass_expiry_until: NaiveDate,
    pub queue_lookback_start: DateTime<Utc>,
}

impl MetricsContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = time_window::local_date(now);
        Self {
            now,
            today,
            window: time_window::trailing_window(now, TRAILING_WINDOW_DAYS),
            month_start: time_window::month_start(now),
            month_key: time_window::month_key(now),
            payment_pending_before: now - Duration::hours(PAYMENT_PENDING_AGE_HOURS),
            aging_application_before: now - Duration::hours(AGING_APPLICATION_HOURS),
            rental_due_soon_until: now + Duration::hours(RENTAL_DUE_SOON_HOURS),
            pass_expiry_until: today
                .checked_add_days(Days::new(PASS_EXPIRY_WINDOW_DAYS))
                .unwrap_or(today),
            queue_lookback_start: now - Duration::days(QUEUE_LOOKBACK_DAYS),
        }
    }
}

//! Account signup aggregation.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, fetch_rows, filter_map};

use super::super::coerce::{datetime_field, display_name, row_id};
use super::super::context::MetricsContext;
use super::super::series::bucket_daily;
use super::super::snapshot::{RecentSignup, UsersKpi};
use super::super::time_window::day_start;
use super::RECENT_CAP;

#[derive(Debug, Clone, Default)]
pub struct UsersBundle {
    pub kpi: UsersKpi,
    pub signup_daily: Vec<i64>,
    pub recent: Vec<RecentSignup>,
}

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<UsersBundle, AppError> {
    let total = count_rows(pool, "app_users", None).await?;

    let window_rows = fetch_rows(
        pool,
        "app_users",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(ctx.window.start.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    let recent_rows = fetch_rows(pool, "app_users", None, RECENT_CAP as i64, "created_at", false).await?;

    Ok(summarize(total, &window_rows, &recent_rows, ctx))
}

pub fn summarize(
    total: i64,
    window_rows: &[Value],
    recent_rows: &[Value],
    ctx: &MetricsContext,
) -> UsersBundle {
    let today_start = day_start(ctx.today);
    let mut new_today = 0_i64;
    let mut new_7d = 0_i64;
    let mut entries = Vec::new();

    for row in window_rows {
        let created = datetime_field(row, "created_at");
        if created.and_then(|at| ctx.window.day_index(at)).is_none() {
            continue;
        }
        new_7d += 1;
        entries.push((created, 1));
        if created.is_some_and(|at| at >= today_start) {
            new_today += 1;
        }
    }

    UsersBundle {
        kpi: UsersKpi {
            total,
            new_today,
            new_7d,
        },
        signup_daily: bucket_daily(&ctx.window, entries),
        recent: recent_rows
            .iter()
            .map(|row| RecentSignup {
                id: row_id(row),
                display_name: display_name(row, &["full_name", "email"]),
                created_at: datetime_field(row, "created_at").map(|at| at.to_rfc3339()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use super::super::super::context::MetricsContext;
    use super::summarize;

    #[test]
    fn counts_today_and_window_signups() {
        let now: DateTime<Utc> = "2026-08-07T03:30:00Z".parse().expect("valid instant");
        let ctx = MetricsContext::at(now);
        let rows = vec![
            json!({ "id": "u1", "created_at": (now - Duration::hours(1)).to_rfc3339(),
                    "full_name": "Kim Minji" }),
            json!({ "id": "u2", "created_at": (now - Duration::days(3)).to_rfc3339() }),
        ];

        let bundle = summarize(100, &rows, &[], &ctx);
        assert_eq!(bundle.kpi.total, 100);
        assert_eq!(bundle.kpi.new_today, 1);
        assert_eq!(bundle.kpi.new_7d, 2);
        assert_eq!(bundle.signup_daily.iter().sum::<i64>(), 2);
    }
}

//! Package subscription order aggregation.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, fetch_rows, filter_map};

use super::super::coerce::{amount_field, datetime_field, text_field};
use super::super::context::MetricsContext;
use super::super::series::bucket_daily;
use super::super::snapshot::PackagesKpi;
use super::super::status::{normalize_payment, PaymentStatus};

#[derive(Debug, Clone, Default)]
pub struct PackagesBundle {
    pub kpi: PackagesKpi,
    pub revenue_daily: Vec<i64>,
}

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<PackagesBundle, AppError> {
    let active = count_rows(
        pool,
        "package_orders",
        Some(&filter_map(&[("status", json!("active"))])),
    )
    .await?;

    let window_rows = fetch_rows(
        pool,
        "package_orders",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(ctx.window.start.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    Ok(summarize(active, &window_rows, ctx))
}

pub fn summarize(active: i64, window_rows: &[Value], ctx: &MetricsContext) -> PackagesBundle {
    let mut paid_7d = 0_i64;
    let mut revenue_7d = 0_i64;
    let mut revenue_entries = Vec::new();

    for row in window_rows {
        if normalize_payment(&text_field(row, "payment_status")) != PaymentStatus::Paid {
            continue;
        }
        let created = datetime_field(row, "created_at");
        if created.and_then(|at| ctx.window.day_index(at)).is_none() {
            continue;
        }
        let amount = amount_field(row, "amount");
        paid_7d += 1;
        revenue_7d += amount;
        revenue_entries.push((created, amount));
    }

    PackagesBundle {
        kpi: PackagesKpi {
            active,
            paid_7d,
            revenue_7d,
        },
        revenue_daily: bucket_daily(&ctx.window, revenue_entries),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use super::super::super::context::MetricsContext;
    use super::summarize;

    #[test]
    fn only_paid_package_orders_contribute_revenue() {
        let now: DateTime<Utc> = "2026-08-07T03:30:00Z".parse().expect("valid instant");
        let ctx = MetricsContext::at(now);
        let rows = vec![
            json!({
                "id": "p1",
                "created_at": (now - Duration::days(1)).to_rfc3339(),
                "payment_status": "payment_completed",
                "amount": 120000,
            }),
            json!({
                "id": "p2",
                "created_at": (now - Duration::days(3)).to_rfc3339(),
                "payment_status": "입금대기",
                "amount": 120000,
            }),
        ];

        let bundle = summarize(4, &rows, &ctx);
        assert_eq!(bundle.kpi.active, 4);
        assert_eq!(bundle.kpi.paid_7d, 1);
        assert_eq!(bundle.kpi.revenue_7d, 120000);
        assert_eq!(bundle.revenue_daily.iter().sum::<i64>(), 120000);
    }
}

//! Stringing-service application aggregation.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, fetch_rows, filter_map};

use super::super::coerce::{
    amount_field, datetime_field, display_name, row_id, status_slug, text_field,
};
use super::super::context::MetricsContext;
use super::super::queues::{aging_applications_queue, Queue, UNRESOLVED_APPLICATION_STATUSES};
use super::super::series::bucket_daily;
use super::super::snapshot::{ApplicationsKpi, RecentApplication};
use super::super::status::{normalize_payment, PaymentStatus};
use super::RECENT_CAP;

#[derive(Debug, Clone, Default)]
pub struct ApplicationsBundle {
    pub kpi: ApplicationsKpi,
    pub revenue_daily: Vec<i64>,
    pub count_daily: Vec<i64>,
    pub status_dist: BTreeMap<String, i64>,
    pub aging: Queue,
    pub recent: Vec<RecentApplication>,
}

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<ApplicationsBundle, AppError> {
    let total = count_rows(pool, "stringing_applications", None).await?;
    let open = count_rows(
        pool,
        "stringing_applications",
        Some(&filter_map(&[(
            "status__in",
            Value::Array(
                UNRESOLVED_APPLICATION_STATUSES
                    .iter()
                    .map(|status| Value::String((*status).to_string()))
                    .collect(),
            ),
        )])),
    )
    .await?;

    let fetch_since = ctx
        .queue_lookback_start
        .min(ctx.month_start)
        .min(ctx.window.start);
    let batch = fetch_rows(
        pool,
        "stringing_applications",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(fetch_since.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    let recent_rows = fetch_rows(
        pool,
        "stringing_applications",
        None,
        RECENT_CAP as i64,
        "created_at",
        false,
    )
    .await?;

    Ok(summarize(total, open, &batch, &recent_rows, ctx))
}

pub fn summarize(
    total: i64,
    open: i64,
    batch: &[Value],
    recent_rows: &[Value],
    ctx: &MetricsContext,
) -> ApplicationsBundle {
    let mut new_7d = 0_i64;
    let mut paid_7d = 0_i64;
    let mut revenue_7d = 0_i64;
    let mut status_dist: BTreeMap<String, i64> = BTreeMap::new();
    let mut revenue_entries = Vec::new();
    let mut count_entries = Vec::new();

    for row in batch {
        let created = datetime_field(row, "created_at");
        let in_window = created.and_then(|at| ctx.window.day_index(at)).is_some();
        if in_window {
            new_7d += 1;
            count_entries.push((created, 1));
            if normalize_payment(&text_field(row, "payment_status")) == PaymentStatus::Paid {
                let amount = amount_field(row, "total_amount");
                paid_7d += 1;
                revenue_7d += amount;
                revenue_entries.push((created, amount));
            }
        }
        if created.is_some_and(|at| at >= ctx.month_start) {
            *status_dist.entry(status_slug(row, "status")).or_insert(0) += 1;
        }
    }

    ApplicationsBundle {
        kpi: ApplicationsKpi {
            total,
            open,
            new_7d,
            paid_7d,
            revenue_7d,
        },
        revenue_daily: bucket_daily(&ctx.window, revenue_entries),
        count_daily: bucket_daily(&ctx.window, count_entries),
        status_dist,
        aging: aging_applications_queue(batch, ctx),
        recent: recent_rows.iter().map(recent_application).collect(),
    }
}

fn recent_application(row: &Value) -> RecentApplication {
    RecentApplication {
        id: row_id(row),
        display_name: display_name(row, &["customer_name", "racket_name"]),
        status: status_slug(row, "status"),
        created_at: datetime_field(row, "created_at").map(|at| at.to_rfc3339()),
    }
}

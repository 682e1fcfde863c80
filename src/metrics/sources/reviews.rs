//! Product review aggregation.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, fetch_rows, filter_map};

use super::super::coerce::{datetime_field, display_name, int_field, row_id};
use super::super::context::MetricsContext;
use super::super::series::bucket_daily;
use super::super::snapshot::{RecentReview, ReviewsKpi};
use super::RECENT_CAP;

#[derive(Debug, Clone, Default)]
pub struct ReviewsBundle {
    pub kpi: ReviewsKpi,
    pub count_daily: Vec<i64>,
    pub recent: Vec<RecentReview>,
}

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<ReviewsBundle, AppError> {
    let total = count_rows(pool, "reviews", None).await?;

    let fetch_since = ctx.month_start.min(ctx.window.start);
    let batch = fetch_rows(
        pool,
        "reviews",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(fetch_since.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    let recent_rows = fetch_rows(pool, "reviews", None, RECENT_CAP as i64, "created_at", false).await?;

    Ok(summarize(total, &batch, &recent_rows, ctx))
}

pub fn summarize(
    total: i64,
    batch: &[Value],
    recent_rows: &[Value],
    ctx: &MetricsContext,
) -> ReviewsBundle {
    let mut new_7d = 0_i64;
    let mut count_entries = Vec::new();
    let mut month_rating_sum = 0_i64;
    let mut month_rating_count = 0_i64;

    for row in batch {
        let created = datetime_field(row, "created_at");
        if created.and_then(|at| ctx.window.day_index(at)).is_some() {
            new_7d += 1;
            count_entries.push((created, 1));
        }
        if created.is_some_and(|at| at >= ctx.month_start) {
            let rating = int_field(row, "rating");
            if rating > 0 {
                month_rating_sum += rating;
                month_rating_count += 1;
            }
        }
    }

    let average_rating = if month_rating_count > 0 {
        round2(month_rating_sum as f64 / month_rating_count as f64)
    } else {
        0.0
    };

    ReviewsBundle {
        kpi: ReviewsKpi {
            total,
            new_7d,
            average_rating,
        },
        count_daily: bucket_daily(&ctx.window, count_entries),
        recent: recent_rows.iter().map(recent_review).collect(),
    }
}

fn recent_review(row: &Value) -> RecentReview {
    RecentReview {
        id: row_id(row),
        display_name: display_name(row, &["author_name", "user_email"]),
        product_name: display_name(row, &["product_name"]),
        rating: int_field(row, "rating"),
        created_at: datetime_field(row, "created_at").map(|at| at.to_rfc3339()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

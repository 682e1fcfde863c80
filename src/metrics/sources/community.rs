//! Community board activity and moderation backlog.

use serde_json::json;
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, filter_map};

use super::super::context::MetricsContext;
use super::super::snapshot::CommunityKpi;

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<CommunityKpi, AppError> {
    let posts_7d = count_rows(
        pool,
        "community_posts",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(ctx.window.start.to_rfc3339()),
        )])),
    )
    .await?;

    let reports_pending = count_rows(
        pool,
        "community_reports",
        Some(&filter_map(&[("status", json!("pending"))])),
    )
    .await?;

    Ok(CommunityKpi {
        posts_7d,
        reports_pending,
    })
}

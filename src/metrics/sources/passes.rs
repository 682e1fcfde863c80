//! Service pass expiry aggregation.

use serde_json::json;
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{fetch_rows, filter_map};

use super::super::context::MetricsContext;
use super::super::queues::{expiring_passes_queue, Queue};

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<Queue, AppError> {
    let rows = fetch_rows(
        pool,
        "service_passes",
        Some(&filter_map(&[
            ("status", json!("active")),
            ("expires_on__gte", json!(ctx.today.to_string())),
            ("expires_on__lte", json!(ctx.pass_expiry_until.to_string())),
        ])),
        20000,
        "expires_on",
        true,
    )
    .await?;

    Ok(expiring_passes_queue(&rows, ctx))
}

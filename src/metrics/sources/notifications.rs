//! Outbound notification queue health.
//!
//! The engine only reads the dispatch queue; sending is another
//! service's job.

use serde_json::json;
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, filter_map};

#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationsBundle {
    pub pending: i64,
    pub failed: i64,
}

pub async fn collect(pool: &PgPool) -> Result<NotificationsBundle, AppError> {
    let pending = count_rows(
        pool,
        "outbound_notifications",
        Some(&filter_map(&[("status", json!("pending"))])),
    )
    .await?;
    let failed = count_rows(
        pool,
        "outbound_notifications",
        Some(&filter_map(&[("status", json!("failed"))])),
    )
    .await?;

    Ok(NotificationsBundle { pending, failed })
}

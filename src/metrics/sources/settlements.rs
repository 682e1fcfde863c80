//! Monthly settlement artifact presence.
//!
//! Settlement snapshots are produced by a separate batch job; the
//! dashboard only reports whether the artifacts for the current and
//! previous local months exist.

use serde_json::Value;
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{fetch_rows, filter_map};

use super::super::coerce::text_field;
use super::super::context::MetricsContext;
use super::super::snapshot::{SettlementArtifact, SettlementsBlock};
use super::super::time_window::shift_month_key;

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<SettlementsBlock, AppError> {
    let current_key = ctx.month_key.clone();
    let previous_key = shift_month_key(&current_key, -1);

    let rows = fetch_rows(
        pool,
        "settlements",
        Some(&filter_map(&[(
            "month__in",
            Value::Array(vec![
                Value::String(current_key.clone()),
                Value::String(previous_key.clone()),
            ]),
        )])),
        10,
        "month",
        false,
    )
    .await?;

    Ok(summarize(&rows, current_key, previous_key))
}

pub fn summarize(rows: &[Value], current_key: String, previous_key: String) -> SettlementsBlock {
    let present = |key: &str| rows.iter().any(|row| text_field(row, "month") == key);
    SettlementsBlock {
        current: SettlementArtifact {
            present: present(&current_key),
            month: current_key,
        },
        previous: SettlementArtifact {
            present: present(&previous_key),
            month: previous_key,
        },
    }
}

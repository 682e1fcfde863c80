//! Loyalty point ledger aggregation.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{fetch_rows, filter_map};

use super::super::coerce::amount_field;
use super::super::context::MetricsContext;
use super::super::snapshot::PointsKpi;

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<PointsKpi, AppError> {
    let rows = fetch_rows(
        pool,
        "point_transactions",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(ctx.month_start.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    Ok(summarize(&rows))
}

/// Month-to-date grants and spends. The ledger stores grants as
/// positive amounts and spends as negative ones.
pub fn summarize(rows: &[Value]) -> PointsKpi {
    let mut granted_month = 0_i64;
    let mut spent_month = 0_i64;
    for row in rows {
        let amount = amount_field(row, "amount");
        if amount >= 0 {
            granted_month += amount;
        } else {
            spent_month += -amount;
        }
    }
    PointsKpi {
        granted_month,
        spent_month,
    }
}

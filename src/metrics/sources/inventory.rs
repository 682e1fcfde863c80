//! Inventory alert aggregation over the product catalog.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{fetch_rows, filter_map};

use super::super::coerce::{display_name, int_field, row_id};
use super::super::snapshot::{InventoryAlert, InventoryKpi};

/// Stock at or below this is flagged; at zero the product is sold out.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

const ALERT_LIST_CAP: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct InventoryBundle {
    pub kpi: InventoryKpi,
    pub alerts: Vec<InventoryAlert>,
}

pub async fn collect(pool: &PgPool) -> Result<InventoryBundle, AppError> {
    let rows = fetch_rows(
        pool,
        "products",
        Some(&filter_map(&[
            ("stock_quantity__lte", json!(LOW_STOCK_THRESHOLD)),
            ("status", json!("active")),
        ])),
        20000,
        "stock_quantity",
        true,
    )
    .await?;

    Ok(summarize(&rows))
}

pub fn summarize(rows: &[Value]) -> InventoryBundle {
    let mut low_stock = 0_i64;
    let mut out_of_stock = 0_i64;
    let mut alerts = Vec::new();

    for row in rows {
        let stock = int_field(row, "stock_quantity");
        if stock > LOW_STOCK_THRESHOLD {
            continue;
        }
        let status = if stock <= 0 {
            out_of_stock += 1;
            "out_of_stock"
        } else {
            low_stock += 1;
            "low_stock"
        };
        alerts.push(InventoryAlert {
            id: row_id(row),
            name: display_name(row, &["name"]),
            brand: display_name(row, &["brand"]),
            stock_quantity: stock.max(0),
            status,
        });
    }

    alerts.sort_by(|left, right| left.stock_quantity.cmp(&right.stock_quantity));
    alerts.truncate(ALERT_LIST_CAP);

    InventoryBundle {
        kpi: InventoryKpi {
            low_stock,
            out_of_stock,
        },
        alerts,
    }
}

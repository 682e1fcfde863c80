//! Order store aggregation: revenue, funnels, attention queues and
//! best-seller rankings.

use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{count_rows, fetch_rows, filter_map};

use super::super::coerce::{
    amount_field, datetime_field, display_name, int_field, row_id, status_slug, text_field,
};
use super::super::context::MetricsContext;
use super::super::queues::{
    cancel_requested_queue, payment_pending_queue, shipping_pending_queue, Queue,
};
use super::super::series::bucket_daily;
use super::super::snapshot::{OrdersKpi, RecentOrder, TopBrand, TopProduct};
use super::super::status::{normalize_payment, PaymentStatus};
use super::super::time_window::day_start;
use super::{RECENT_CAP, TOP_RANKING_CAP};

#[derive(Debug, Clone, Default)]
pub struct OrdersBundle {
    pub kpi: OrdersKpi,
    pub revenue_daily: Vec<i64>,
    pub count_daily: Vec<i64>,
    pub status_dist: BTreeMap<String, i64>,
    pub payment_dist: BTreeMap<String, i64>,
    pub payment_pending: Queue,
    pub cancel_requested: Queue,
    pub shipping_pending: Queue,
    pub top_products: Vec<TopProduct>,
    pub top_brands: Vec<TopBrand>,
    pub recent: Vec<RecentOrder>,
}

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<OrdersBundle, AppError> {
    let total = count_rows(pool, "orders", None).await?;

    let fetch_since = ctx
        .queue_lookback_start
        .min(ctx.month_start)
        .min(ctx.window.start);
    let batch = fetch_rows(
        pool,
        "orders",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(fetch_since.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    let recent_rows = fetch_rows(pool, "orders", None, RECENT_CAP as i64, "created_at", false).await?;

    let paid_ids = paid_window_order_ids(&batch, ctx);
    let items = if paid_ids.is_empty() {
        Vec::new()
    } else {
        fetch_rows(
            pool,
            "order_items",
            Some(&filter_map(&[(
                "order_id__in",
                Value::Array(paid_ids.iter().cloned().map(Value::String).collect()),
            )])),
            20000,
            "order_id",
            true,
        )
        .await?
    };

    Ok(summarize(total, &batch, &items, &recent_rows, ctx))
}

fn paid_window_order_ids(batch: &[Value], ctx: &MetricsContext) -> Vec<String> {
    batch
        .iter()
        .filter(|row| {
            normalize_payment(&text_field(row, "payment_status")) == PaymentStatus::Paid
                && datetime_field(row, "created_at")
                    .and_then(|at| ctx.window.day_index(at))
                    .is_some()
        })
        .map(row_id)
        .filter(|id| !id.is_empty())
        .collect()
}

pub fn summarize(
    total: i64,
    batch: &[Value],
    paid_items: &[Value],
    recent_rows: &[Value],
    ctx: &MetricsContext,
) -> OrdersBundle {
    let today_start = day_start(ctx.today);

    let mut today = 0_i64;
    let mut paid_7d = 0_i64;
    let mut revenue_7d = 0_i64;
    let mut month_revenue = 0_i64;
    let mut status_dist: BTreeMap<String, i64> = BTreeMap::new();
    let mut payment_dist: BTreeMap<String, i64> = BTreeMap::new();
    let mut revenue_entries = Vec::new();
    let mut count_entries = Vec::new();

    for row in batch {
        let created = datetime_field(row, "created_at");
        let payment = normalize_payment(&text_field(row, "payment_status"));
        let amount = amount_field(row, "total_amount");
        let in_window = created.and_then(|at| ctx.window.day_index(at)).is_some();

        if created.is_some_and(|at| at >= today_start) {
            today += 1;
        }
        if in_window {
            count_entries.push((created, 1));
            if payment == PaymentStatus::Paid {
                paid_7d += 1;
                revenue_7d += amount;
                revenue_entries.push((created, amount));
            }
        }
        if created.is_some_and(|at| at >= ctx.month_start) {
            *status_dist.entry(status_slug(row, "status")).or_insert(0) += 1;
            *payment_dist.entry(payment.as_str().to_string()).or_insert(0) += 1;
            if payment == PaymentStatus::Paid {
                month_revenue += amount;
            }
        }
    }

    let aov_7d = if paid_7d > 0 { revenue_7d / paid_7d } else { 0 };

    let (top_products, top_brands) = top_rankings(paid_items);

    OrdersBundle {
        kpi: OrdersKpi {
            total,
            today,
            paid_7d,
            revenue_7d,
            aov_7d,
            month_revenue,
        },
        revenue_daily: bucket_daily(&ctx.window, revenue_entries),
        count_daily: bucket_daily(&ctx.window, count_entries),
        status_dist,
        payment_dist,
        payment_pending: payment_pending_queue(batch, ctx),
        cancel_requested: cancel_requested_queue(batch, ctx),
        shipping_pending: shipping_pending_queue(batch, ctx),
        top_products,
        top_brands,
        recent: recent_rows.iter().map(recent_order).collect(),
    }
}

fn recent_order(row: &Value) -> RecentOrder {
    RecentOrder {
        id: row_id(row),
        display_name: display_name(row, &["customer_name", "user_email"]),
        amount: amount_field(row, "total_amount"),
        status: status_slug(row, "status"),
        created_at: datetime_field(row, "created_at").map(|at| at.to_rfc3339()),
    }
}

fn line_revenue(item: &Value) -> i64 {
    let line_total = amount_field(item, "line_total");
    if line_total > 0 {
        return line_total;
    }
    amount_field(item, "unit_price") * int_field(item, "quantity").max(0)
}

/// Best-selling products and brands over the already-filtered paid
/// order items: revenue descending, quantity breaking ties, capped.
pub fn top_rankings(paid_items: &[Value]) -> (Vec<TopProduct>, Vec<TopBrand>) {
    let mut products: HashMap<String, TopProduct> = HashMap::new();
    let mut brands: HashMap<String, TopBrand> = HashMap::new();

    for item in paid_items {
        let product_id = {
            let id = text_field(item, "product_id");
            if id.is_empty() {
                text_field(item, "product_name")
            } else {
                id
            }
        };
        if product_id.is_empty() {
            continue;
        }
        let quantity = int_field(item, "quantity").max(0);
        let revenue = line_revenue(item);
        let brand = display_name(item, &["brand"]);

        let product = products.entry(product_id.clone()).or_insert_with(|| TopProduct {
            product_id,
            name: display_name(item, &["product_name"]),
            brand: brand.clone(),
            quantity: 0,
            revenue: 0,
        });
        product.quantity += quantity;
        product.revenue += revenue;

        let brand_entry = brands.entry(brand.clone()).or_insert_with(|| TopBrand {
            brand,
            quantity: 0,
            revenue: 0,
        });
        brand_entry.quantity += quantity;
        brand_entry.revenue += revenue;
    }

    let mut products: Vec<TopProduct> = products.into_values().collect();
    products.sort_by(|left, right| {
        right
            .revenue
            .cmp(&left.revenue)
            .then(right.quantity.cmp(&left.quantity))
            .then(left.name.cmp(&right.name))
    });
    products.truncate(TOP_RANKING_CAP);

    let mut brands: Vec<TopBrand> = brands.into_values().collect();
    brands.sort_by(|left, right| {
        right
            .revenue
            .cmp(&left.revenue)
            .then(right.quantity.cmp(&left.quantity))
            .then(left.brand.cmp(&right.brand))
    });
    brands.truncate(TOP_RANKING_CAP);

    (products, brands)
}

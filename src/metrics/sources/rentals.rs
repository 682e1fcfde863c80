//! Racket rental aggregation.
//!
//! Rental money splits into a refundable deposit and the earned
//! components (rental fee, string, stringing labor). Deposits are
//! liabilities, not revenue, so every revenue figure here is built
//! from the earned components only.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::AppError;
use crate::repository::read_store::{fetch_rows, filter_map};

use super::super::coerce::{amount_field, datetime_field, text_field};
use super::super::context::MetricsContext;
use super::super::queues::{rental_due_queues, Queue, RENTAL_CHECKED_OUT_STATUSES};
use super::super::series::bucket_daily;
use super::super::snapshot::RentalsKpi;
use super::super::status::{normalize_payment, PaymentStatus};

#[derive(Debug, Clone, Default)]
pub struct RentalsBundle {
    pub kpi: RentalsKpi,
    pub revenue_daily: Vec<i64>,
    pub overdue: Queue,
    pub due_soon: Queue,
}

/// Earned rental amount: fee + string + stringing labor. The deposit
/// is excluded; it goes back to the customer.
pub fn rental_revenue(row: &Value) -> i64 {
    amount_field(row, "fee_amount")
        + amount_field(row, "string_price")
        + amount_field(row, "stringing_fee")
}

pub async fn collect(pool: &PgPool, ctx: &MetricsContext) -> Result<RentalsBundle, AppError> {
    let checked_out_rows = fetch_rows(
        pool,
        "rentals",
        Some(&filter_map(&[(
            "status__in",
            Value::Array(
                RENTAL_CHECKED_OUT_STATUSES
                    .iter()
                    .map(|status| Value::String((*status).to_string()))
                    .collect(),
            ),
        )])),
        20000,
        "due_at",
        true,
    )
    .await?;

    let window_rows = fetch_rows(
        pool,
        "rentals",
        Some(&filter_map(&[(
            "created_at__gte",
            json!(ctx.window.start.to_rfc3339()),
        )])),
        20000,
        "created_at",
        false,
    )
    .await?;

    Ok(summarize(&checked_out_rows, &window_rows, ctx))
}

pub fn summarize(
    checked_out_rows: &[Value],
    window_rows: &[Value],
    ctx: &MetricsContext,
) -> RentalsBundle {
    let (overdue, due_soon) = rental_due_queues(checked_out_rows, ctx);

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
        let amount = rental_revenue(row);
        revenue_7d += amount;
        revenue_entries.push((created, amount));
    }

    RentalsBundle {
        kpi: RentalsKpi {
            checked_out: checked_out_rows.len() as i64,
            overdue: overdue.count,
            due_soon: due_soon.count,
            revenue_7d,
        },
        revenue_daily: bucket_daily(&ctx.window, revenue_entries),
        overdue,
        due_soon,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use super::super::super::context::MetricsContext;
    use super::{rental_revenue, summarize};

    #[test]
    fn deposits_are_not_revenue() {
        let rental = json!({
            "deposit_amount": 50000,
            "fee_amount": 10000,
            "string_price": 5000,
            "stringing_fee": 3000,
        });
        assert_eq!(rental_revenue(&rental), 18000);
    }

    #[test]
    fn window_revenue_sums_earned_components_of_paid_rentals() {
        let now: DateTime<Utc> = "2026-08-07T03:30:00Z".parse().expect("valid instant");
        let ctx = MetricsContext::at(now);
        let window_rows = vec![
            json!({
                "id": "r1",
                "created_at": (now - Duration::days(1)).to_rfc3339(),
                "status": "returned",
                "payment_status": "결제완료",
                "deposit_amount": 50000,
                "fee_amount": 10000,
                "string_price": 5000,
                "stringing_fee": 3000,
            }),
            json!({
                "id": "r2",
                "created_at": (now - Duration::days(2)).to_rfc3339(),
                "status": "checked_out",
                "payment_status": "pending",
                "deposit_amount": 50000,
                "fee_amount": 99000,
            }),
        ];

        let bundle = summarize(&[], &window_rows, &ctx);
        assert_eq!(bundle.kpi.revenue_7d, 18000);
        assert_eq!(bundle.revenue_daily.iter().sum::<i64>(), 18000);
    }

    #[test]
    fn checked_out_counts_split_into_overdue_and_due_soon() {
        let now: DateTime<Utc> = "2026-08-07T03:30:00Z".parse().expect("valid instant");
        let ctx = MetricsContext::at(now);
        let checked_out = vec![
            json!({
                "id": "late",
                "status": "checked_out",
                "due_at": (now - Duration::days(1)).to_rfc3339(),
                "customer_name": "Lee",
            }),
            json!({
                "id": "soon",
                "status": "대여중",
                "due_at": (now + Duration::hours(2)).to_rfc3339(),
            }),
            json!({
                "id": "comfortable",
                "status": "checked_out",
                "due_at": (now + Duration::days(10)).to_rfc3339(),
            }),
        ];

        let bundle = summarize(&checked_out, &[], &ctx);
        assert_eq!(bundle.kpi.checked_out, 3);
        assert_eq!(bundle.kpi.overdue, 1);
        assert_eq!(bundle.kpi.due_soon, 1);
        assert_eq!(bundle.overdue.items[0].id, "late");
        assert_eq!(bundle.due_soon.items[0].id, "soon");
    }
}

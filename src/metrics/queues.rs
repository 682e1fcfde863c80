//! Operator-attention queues.
//!
//! Each queue is a predicate over one entity's records plus a fixed
//! time threshold, yielding an uncapped count and a detail list sorted
//! oldest/soonest first and capped at ten. Remaining-time metrics round
//! up, so an item one minute from due reads "1 hour", never "0".

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use super::coerce::{
    amount_field, date_field, datetime_field, display_name, row_id, status_slug, text_field,
};
use super::context::MetricsContext;
use super::status::{normalize_cancel, normalize_payment, CancelStatus, PaymentStatus};
use super::time_window::day_start;

pub const QUEUE_DETAIL_CAP: usize = 10;

/// Order lifecycle states that no longer need shipping attention.
pub const TERMINAL_ORDER_STATUSES: &[&str] =
    &["delivered", "purchase_confirmed", "cancelled", "refunded"];

/// Shipping methods picked up in store; these never carry tracking.
pub const PICKUP_SHIPPING_METHODS: &[&str] = &["pickup", "store_pickup"];

pub const RENTAL_CHECKED_OUT_STATUSES: &[&str] = &["checked_out", "대여중"];

/// Stringing applications still in the working pipeline.
pub const UNRESOLVED_APPLICATION_STATUSES: &[&str] = &["received", "in_review", "in_progress"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgeMetric {
    #[serde(rename = "hoursAgo")]
    HoursAgo(i64),
    #[serde(rename = "daysAgo")]
    DaysAgo(i64),
    #[serde(rename = "overdueDays")]
    OverdueDays(i64),
    #[serde(rename = "dueInHours")]
    DueInHours(i64),
    #[serde(rename = "daysLeft")]
    DaysLeft(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub kind: &'static str,
    pub id: String,
    pub created_at: Option<String>,
    pub display_name: String,
    pub amount: i64,
    pub status: String,
    pub href: String,
    #[serde(flatten)]
    pub age: AgeMetric,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub count: i64,
    pub items: Vec<QueueItem>,
}

pub fn hours_elapsed(now: DateTime<Utc>, since: DateTime<Utc>) -> i64 {
    (now - since).num_hours().max(0)
}

pub fn days_elapsed(now: DateTime<Utc>, since: DateTime<Utc>) -> i64 {
    (now - since).num_days().max(0)
}

/// Hours until `due`, rounded up, never 0.
pub fn hours_until(now: DateTime<Utc>, due: DateTime<Utc>) -> i64 {
    let minutes = (due - now).num_minutes();
    ((minutes + 59) / 60).max(1)
}

/// Days until `expiry`, never 0; an item expiring today reads "1".
pub fn days_until(today: NaiveDate, expiry: NaiveDate) -> i64 {
    (expiry - today).num_days().max(1)
}

fn sorted_capped(mut entries: Vec<(DateTime<Utc>, QueueItem)>) -> Queue {
    entries.sort_by(|left, right| left.0.cmp(&right.0));
    let count = entries.len() as i64;
    let items = entries
        .into_iter()
        .take(QUEUE_DETAIL_CAP)
        .map(|(_, item)| item)
        .collect();
    Queue { count, items }
}

fn order_item(row: &Value, age: AgeMetric, created: DateTime<Utc>, status: String) -> QueueItem {
    QueueItem {
        kind: "order",
        id: row_id(row),
        created_at: Some(created.to_rfc3339()),
        display_name: display_name(row, &["customer_name", "user_email"]),
        amount: amount_field(row, "total_amount"),
        status,
        href: format!("/admin/orders/{}", row_id(row)),
        age,
    }
}

/// Orders whose payment has been pending for 24 hours or more, skipping
/// anything under an active or approved cancellation so the same order
/// never shows in two queues at once.
pub fn payment_pending_queue(rows: &[Value], ctx: &MetricsContext) -> Queue {
    let mut entries = Vec::new();
    for row in rows {
        if normalize_payment(&text_field(row, "payment_status")) != PaymentStatus::Pending {
            continue;
        }
        if !matches!(
            normalize_cancel(&text_field(row, "cancel_status")),
            CancelStatus::None | CancelStatus::Rejected
        ) {
            continue;
        }
        let Some(created) = datetime_field(row, "created_at") else {
            continue;
        };
        if created > ctx.payment_pending_before {
            continue;
        }
        let age = AgeMetric::HoursAgo(hours_elapsed(ctx.now, created));
        entries.push((
            created,
            order_item(row, age, created, PaymentStatus::Pending.as_str().to_string()),
        ));
    }
    sorted_capped(entries)
}

/// Orders with an open cancellation request awaiting a decision.
pub fn cancel_requested_queue(rows: &[Value], ctx: &MetricsContext) -> Queue {
    let mut entries = Vec::new();
    for row in rows {
        if normalize_cancel(&text_field(row, "cancel_status")) != CancelStatus::Requested {
            continue;
        }
        let Some(created) = datetime_field(row, "created_at") else {
            continue;
        };
        let age = AgeMetric::HoursAgo(hours_elapsed(ctx.now, created));
        entries.push((
            created,
            order_item(row, age, created, CancelStatus::Requested.as_str().to_string()),
        ));
    }
    sorted_capped(entries)
}

/// Paid, non-terminal orders with no tracking reference. Pickup orders
/// never need tracking and are skipped.
pub fn shipping_pending_queue(rows: &[Value], ctx: &MetricsContext) -> Queue {
    let mut entries = Vec::new();
    for row in rows {
        if normalize_payment(&text_field(row, "payment_status")) != PaymentStatus::Paid {
            continue;
        }
        let lifecycle = status_slug(row, "status");
        if TERMINAL_ORDER_STATUSES.contains(&lifecycle.as_str()) {
            continue;
        }
        if !text_field(row, "tracking_number").is_empty() {
            continue;
        }
        if PICKUP_SHIPPING_METHODS.contains(&status_slug(row, "shipping_method").as_str()) {
            continue;
        }
        let Some(created) = datetime_field(row, "created_at") else {
            continue;
        };
        let age = AgeMetric::DaysAgo(days_elapsed(ctx.now, created));
        entries.push((created, order_item(row, age, created, lifecycle)));
    }
    sorted_capped(entries)
}

fn rental_item(row: &Value, age: AgeMetric) -> QueueItem {
    QueueItem {
        kind: "rental",
        id: row_id(row),
        created_at: datetime_field(row, "created_at").map(|at| at.to_rfc3339()),
        display_name: display_name(row, &["customer_name", "racket_name"]),
        amount: super::sources::rentals::rental_revenue(row),
        status: status_slug(row, "status"),
        href: format!("/admin/rentals/{}", row_id(row)),
        age,
    }
}

/// Checked-out rentals split into overdue (due at or before now) and
/// due-soon (due within the next 48 hours). The time ranges are
/// disjoint, so a rental appears in at most one of the two.
pub fn rental_due_queues(rows: &[Value], ctx: &MetricsContext) -> (Queue, Queue) {
    let mut overdue = Vec::new();
    let mut due_soon = Vec::new();
    for row in rows {
        if !RENTAL_CHECKED_OUT_STATUSES.contains(&status_slug(row, "status").as_str()) {
            continue;
        }
        let Some(due) = datetime_field(row, "due_at") else {
            continue;
        };
        if due <= ctx.now {
            let age = AgeMetric::OverdueDays(days_elapsed(ctx.now, due));
            overdue.push((due, rental_item(row, age)));
        } else if due <= ctx.rental_due_soon_until {
            let age = AgeMetric::DueInHours(hours_until(ctx.now, due));
            due_soon.push((due, rental_item(row, age)));
        }
    }
    (sorted_capped(overdue), sorted_capped(due_soon))
}

/// Stringing applications still unresolved 72 hours after submission.
pub fn aging_applications_queue(rows: &[Value], ctx: &MetricsContext) -> Queue {
    let mut entries = Vec::new();
    for row in rows {
        let lifecycle = status_slug(row, "status");
        if !UNRESOLVED_APPLICATION_STATUSES.contains(&lifecycle.as_str()) {
            continue;
        }
        let Some(created) = datetime_field(row, "created_at") else {
            continue;
        };
        if created > ctx.aging_application_before {
            continue;
        }
        let age = AgeMetric::DaysAgo(days_elapsed(ctx.now, created));
        entries.push((
            created,
            QueueItem {
                kind: "application",
                id: row_id(row),
                created_at: Some(created.to_rfc3339()),
                display_name: display_name(row, &["customer_name", "racket_name"]),
                amount: amount_field(row, "total_amount"),
                status: lifecycle,
                href: format!("/admin/applications/{}", row_id(row)),
                age,
            },
        ));
    }
    sorted_capped(entries)
}

/// Active service passes expiring within the next 30 days, soonest
/// expiry first.
pub fn expiring_passes_queue(rows: &[Value], ctx: &MetricsContext) -> Queue {
    let mut entries = Vec::new();
    for row in rows {
        if status_slug(row, "status") != "active" {
            continue;
        }
        let Some(expiry) = date_field(row, "expires_on") else {
            continue;
        };
        if expiry < ctx.today || expiry > ctx.pass_expiry_until {
            continue;
        }
        let age = AgeMetric::DaysLeft(days_until(ctx.today, expiry));
        entries.push((
            day_start(expiry),
            QueueItem {
                kind: "pass",
                id: row_id(row),
                created_at: datetime_field(row, "created_at").map(|at| at.to_rfc3339()),
                display_name: display_name(row, &["user_name", "pass_type"]),
                amount: amount_field(row, "price"),
                status: "active".to_string(),
                href: format!("/admin/passes/{}", row_id(row)),
                age,
            },
        ));
    }
    sorted_capped(entries)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::{json, Value};

    use super::super::context::MetricsContext;
    use super::{
        aging_applications_queue, cancel_requested_queue, expiring_passes_queue, hours_until,
        payment_pending_queue, rental_due_queues, shipping_pending_queue, AgeMetric,
        QUEUE_DETAIL_CAP,
    };

    fn ctx() -> MetricsContext {
        let now: DateTime<Utc> = "2026-08-07T03:30:00Z".parse().expect("valid instant");
        MetricsContext::at(now)
    }

    fn order(id: &str, created: DateTime<Utc>, payment: &str, cancel: &str) -> Value {
        json!({
            "id": id,
            "created_at": created.to_rfc3339(),
            "total_amount": 30000,
            "payment_status": payment,
            "cancel_status": cancel,
            "status": "new",
            "shipping_method": "courier",
            "customer_name": "Kim",
        })
    }

    #[test]
    fn payment_pending_excludes_active_cancel_requests() {
        let ctx = ctx();
        let old = ctx.now - Duration::hours(30);
        let rows = vec![
            order("a", old, "입금대기", ""),
            order("b", old, "pending", "cancel_requested"),
            order("c", ctx.now - Duration::hours(2), "pending", ""),
            order("d", old, "paid", ""),
        ];

        let pending = payment_pending_queue(&rows, &ctx);
        let cancels = cancel_requested_queue(&rows, &ctx);

        assert_eq!(pending.count, 1);
        assert_eq!(pending.items[0].id, "a");
        assert_eq!(pending.items[0].age, AgeMetric::HoursAgo(30));

        assert_eq!(cancels.count, 1);
        assert_eq!(cancels.items[0].id, "b");

        let pending_ids: Vec<_> = pending.items.iter().map(|item| &item.id).collect();
        let cancel_ids: Vec<_> = cancels.items.iter().map(|item| &item.id).collect();
        assert!(pending_ids.iter().all(|id| !cancel_ids.contains(id)));
    }

    #[test]
    fn shipping_pending_skips_pickup_terminal_and_tracked_orders() {
        let ctx = ctx();
        let created = ctx.now - Duration::hours(5);
        let mut tracked = order("t", created, "paid", "");
        tracked["tracking_number"] = json!("1Z999");
        let mut pickup = order("p", created, "paid", "");
        pickup["shipping_method"] = json!("store_pickup");
        let mut delivered = order("d", created, "결제완료", "");
        delivered["status"] = json!("delivered");
        let rows = vec![
            order("s", created, "결제완료", ""),
            tracked,
            pickup,
            delivered,
            order("u", created, "pending", ""),
        ];

        let queue = shipping_pending_queue(&rows, &ctx);
        assert_eq!(queue.count, 1);
        assert_eq!(queue.items[0].id, "s");
    }

    #[test]
    fn rental_overdue_and_due_soon_are_disjoint() {
        let ctx = ctx();
        let rental = |id: &str, due: DateTime<Utc>| {
            json!({
                "id": id,
                "created_at": (ctx.now - Duration::days(3)).to_rfc3339(),
                "status": "checked_out",
                "due_at": due.to_rfc3339(),
                "customer_name": "Lee",
                "deposit_amount": 50000,
                "fee_amount": 10000,
                "string_price": 5000,
                "stringing_fee": 3000,
            })
        };
        let rows = vec![
            rental("overdue", ctx.now - Duration::days(2)),
            rental("soon", ctx.now + Duration::hours(2)),
            rental("later", ctx.now + Duration::hours(80)),
            json!({ "id": "returned", "status": "returned",
                    "due_at": (ctx.now - Duration::days(1)).to_rfc3339() }),
        ];

        let (overdue, due_soon) = rental_due_queues(&rows, &ctx);
        assert_eq!(overdue.count, 1);
        assert_eq!(overdue.items[0].id, "overdue");
        assert_eq!(overdue.items[0].age, AgeMetric::OverdueDays(2));
        // Deposit stays out of the displayed amount.
        assert_eq!(overdue.items[0].amount, 18000);

        assert_eq!(due_soon.count, 1);
        assert_eq!(due_soon.items[0].id, "soon");
        assert_eq!(due_soon.items[0].age, AgeMetric::DueInHours(2));
    }

    #[test]
    fn due_in_one_minute_reads_one_hour() {
        let now: DateTime<Utc> = "2026-08-07T03:30:00Z".parse().expect("valid instant");
        assert_eq!(hours_until(now, now + Duration::minutes(1)), 1);
        assert_eq!(hours_until(now, now + Duration::minutes(61)), 2);
        assert_eq!(hours_until(now, now + Duration::hours(2)), 2);
    }

    #[test]
    fn aging_applications_use_floor_days() {
        let ctx = ctx();
        let rows = vec![
            json!({
                "id": "old",
                "status": "In Review",
                "created_at": (ctx.now - Duration::days(4)).to_rfc3339(),
                "customer_name": "Park",
                "total_amount": 25000,
            }),
            json!({
                "id": "fresh",
                "status": "received",
                "created_at": (ctx.now - Duration::hours(10)).to_rfc3339(),
            }),
            json!({
                "id": "done",
                "status": "completed",
                "created_at": (ctx.now - Duration::days(10)).to_rfc3339(),
            }),
        ];

        let queue = aging_applications_queue(&rows, &ctx);
        assert_eq!(queue.count, 1);
        assert_eq!(queue.items[0].id, "old");
        assert_eq!(queue.items[0].age, AgeMetric::DaysAgo(4));
    }

    #[test]
    fn pass_expiring_today_shows_one_day_left() {
        let ctx = ctx();
        let rows = vec![
            json!({ "id": "today", "status": "active",
                    "expires_on": ctx.today.to_string(), "user_name": "Choi" }),
            json!({ "id": "expired", "status": "active", "expires_on": "2026-08-01" }),
            json!({ "id": "far", "status": "active", "expires_on": "2026-12-01" }),
            json!({ "id": "inactive", "status": "used_up",
                    "expires_on": ctx.today.to_string() }),
        ];

        let queue = expiring_passes_queue(&rows, &ctx);
        assert_eq!(queue.count, 1);
        assert_eq!(queue.items[0].id, "today");
        assert_eq!(queue.items[0].age, AgeMetric::DaysLeft(1));
    }

    #[test]
    fn detail_lists_sort_oldest_first_and_cap_at_ten() {
        let ctx = ctx();
        let rows: Vec<Value> = (0..15)
            .map(|offset| {
                order(
                    &format!("o{offset}"),
                    ctx.now - Duration::days(1) - Duration::hours(offset),
                    "pending",
                    "",
                )
            })
            .collect();

        let queue = payment_pending_queue(&rows, &ctx);
        assert_eq!(queue.count, 15);
        assert_eq!(queue.items.len(), QUEUE_DETAIL_CAP);
        // Oldest first: the largest hour offset leads.
        assert_eq!(queue.items[0].id, "o14");
        for pair in queue.items.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }
}

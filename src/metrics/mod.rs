//! The operational metrics engine behind the admin dashboard.
//!
//! One invocation reads every transactional store, normalizes their
//! status vocabularies, derives windows and attention queues from a
//! single captured instant, and assembles one consistent snapshot.
//! There is no partial output: if any store read fails, the whole
//! build fails and the dashboard shows one error state.

pub mod coerce;
pub mod context;
pub mod queues;
pub mod series;
pub mod snapshot;
pub mod sources;
pub mod status;
pub mod time_window;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppResult;

use context::MetricsContext;
use snapshot::{
    DashboardSnapshot, DistBlock, KpiBlock, QueueCounts, QueueDetailsBlock, RecentBlock,
    RevenueBySource, SeriesBlock, SettlementsBlock, TopBlock, WindowMeta, RECOMMENDED_MAX_AGE_SECS,
    SNAPSHOT_VERSION,
};
use sources::applications::ApplicationsBundle;
use sources::inventory::InventoryBundle;
use sources::notifications::NotificationsBundle;
use sources::orders::OrdersBundle;
use sources::packages::PackagesBundle;
use sources::rentals::RentalsBundle;
use sources::reviews::ReviewsBundle;
use sources::users::UsersBundle;

pub async fn build_snapshot(pool: &PgPool) -> AppResult<DashboardSnapshot> {
    build_snapshot_at(pool, Utc::now()).await
}

/// Build the snapshot as of `generated_at`.
///
/// The instant is captured before any aggregator runs and every window
/// and threshold derives from it, so the concurrently-executing reads
/// are all evaluated against the same "now". The fan-out joins all
/// aggregators and propagates the first failure.
pub async fn build_snapshot_at(
    pool: &PgPool,
    generated_at: DateTime<Utc>,
) -> AppResult<DashboardSnapshot> {
    let ctx = MetricsContext::at(generated_at);

    let (
        orders,
        applications,
        rentals,
        packages,
        reviews,
        users,
        inventory,
        community,
        points,
        notifications,
        pass_expiring,
        settlements,
    ) = tokio::try_join!(
        sources::orders::collect(pool, &ctx),
        sources::applications::collect(pool, &ctx),
        sources::rentals::collect(pool, &ctx),
        sources::packages::collect(pool, &ctx),
        sources::reviews::collect(pool, &ctx),
        sources::users::collect(pool, &ctx),
        sources::inventory::collect(pool),
        sources::community::collect(pool, &ctx),
        sources::points::collect(pool, &ctx),
        sources::notifications::collect(pool),
        sources::passes::collect(pool, &ctx),
        sources::settlements::collect(pool, &ctx),
    )?;

    tracing::debug!(
        orders_total = orders.kpi.total,
        window_days = ctx.window.days,
        "Assembled dashboard snapshot"
    );

    Ok(assemble(
        &ctx,
        orders,
        applications,
        rentals,
        packages,
        reviews,
        users,
        inventory,
        community,
        points,
        notifications,
        pass_expiring,
        settlements,
    ))
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    ctx: &MetricsContext,
    orders: OrdersBundle,
    applications: ApplicationsBundle,
    rentals: RentalsBundle,
    packages: PackagesBundle,
    reviews: ReviewsBundle,
    users: UsersBundle,
    inventory: InventoryBundle,
    community: snapshot::CommunityKpi,
    points: snapshot::PointsKpi,
    notifications: NotificationsBundle,
    pass_expiring: queues::Queue,
    settlements: SettlementsBlock,
) -> DashboardSnapshot {
    let window = &ctx.window;
    let revenue_merged = series::merge(
        window,
        &[
            &orders.revenue_daily,
            &applications.revenue_daily,
            &rentals.revenue_daily,
            &packages.revenue_daily,
        ],
    );

    let series_block = SeriesBlock {
        window: WindowMeta {
            days: window.days,
            from: window.date_keys.first().cloned().unwrap_or_default(),
            to: window.date_keys.last().cloned().unwrap_or_default(),
        },
        revenue: series::to_points(window, &revenue_merged),
        revenue_by_source: RevenueBySource {
            orders: orders.revenue_daily.clone(),
            applications: applications.revenue_daily.clone(),
            rentals: rentals.revenue_daily.clone(),
            packages: packages.revenue_daily.clone(),
        },
        orders: series::to_points(window, &orders.count_daily),
        applications: series::to_points(window, &applications.count_daily),
        signups: series::to_points(window, &users.signup_daily),
        reviews: series::to_points(window, &reviews.count_daily),
    };

    let queue_counts = QueueCounts {
        payment_pending: orders.payment_pending.count,
        cancel_requested: orders.cancel_requested.count,
        shipping_pending: orders.shipping_pending.count,
        rental_overdue: rentals.overdue.count,
        rental_due_soon: rentals.due_soon.count,
        aging_applications: applications.aging.count,
        pass_expiring: pass_expiring.count,
        notifications_pending: notifications.pending,
        notifications_failed: notifications.failed,
    };

    DashboardSnapshot {
        version: SNAPSHOT_VERSION,
        generated_at: ctx.now.to_rfc3339(),
        cache_max_age_secs: RECOMMENDED_MAX_AGE_SECS,
        series: series_block,
        kpi: KpiBlock {
            users: users.kpi,
            orders: orders.kpi,
            applications: applications.kpi,
            rentals: rentals.kpi,
            packages: packages.kpi,
            reviews: reviews.kpi,
            points,
            community,
            inventory: inventory.kpi,
            queue: queue_counts,
        },
        dist: DistBlock {
            order_status: orders.status_dist,
            order_payment: orders.payment_dist,
            application_status: applications.status_dist,
        },
        inventory_list: inventory.alerts,
        top: TopBlock {
            products: orders.top_products,
            brands: orders.top_brands,
        },
        queue_details: QueueDetailsBlock {
            payment_pending: orders.payment_pending.items,
            cancel_requested: orders.cancel_requested.items,
            shipping_pending: orders.shipping_pending.items,
            rental_overdue: rentals.overdue.items,
            rental_due_soon: rentals.due_soon.items,
            aging_applications: applications.aging.items,
            pass_expiring: pass_expiring.items,
        },
        recent: RecentBlock {
            orders: orders.recent,
            applications: applications.recent,
            reviews: reviews.recent,
            signups: users.recent,
        },
        settlements,
    }
}

//! The versioned dashboard snapshot contract.
//!
//! One invocation of the engine produces exactly one of these, stamped
//! with a single `generated_at` instant. It has no persisted identity;
//! the caller serializes it and throws it away.

use std::collections::BTreeMap;

use serde::Serialize;

use super::queues::QueueItem;
use super::series::SeriesPoint;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Freshness window the engine recommends to whatever caches the
/// response; the engine itself never stores a snapshot.
pub const RECOMMENDED_MAX_AGE_SECS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub version: u32,
    pub generated_at: String,
    pub cache_max_age_secs: u32,
    pub series: SeriesBlock,
    pub kpi: KpiBlock,
    pub dist: DistBlock,
    pub inventory_list: Vec<InventoryAlert>,
    pub top: TopBlock,
    pub queue_details: QueueDetailsBlock,
    pub recent: RecentBlock,
    pub settlements: SettlementsBlock,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMeta {
    pub days: u32,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesBlock {
    pub window: WindowMeta,
    /// Combined revenue across orders, applications, rentals and
    /// packages; equals the per-date sum of `revenue_by_source`.
    pub revenue: Vec<SeriesPoint>,
    pub revenue_by_source: RevenueBySource,
    pub orders: Vec<SeriesPoint>,
    pub applications: Vec<SeriesPoint>,
    pub signups: Vec<SeriesPoint>,
    pub reviews: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBySource {
    pub orders: Vec<i64>,
    pub applications: Vec<i64>,
    pub rentals: Vec<i64>,
    pub packages: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiBlock {
    pub users: UsersKpi,
    pub orders: OrdersKpi,
    pub applications: ApplicationsKpi,
    pub rentals: RentalsKpi,
    pub packages: PackagesKpi,
    pub reviews: ReviewsKpi,
    pub points: PointsKpi,
    pub community: CommunityKpi,
    pub inventory: InventoryKpi,
    pub queue: QueueCounts,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersKpi {
    pub total: i64,
    pub new_today: i64,
    pub new_7d: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersKpi {
    pub total: i64,
    pub today: i64,
    pub paid_7d: i64,
    pub revenue_7d: i64,
    /// Average order value over paid orders in the window; 0 when no
    /// order was paid.
    pub aov_7d: i64,
    pub month_revenue: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationsKpi {
    pub total: i64,
    pub open: i64,
    pub new_7d: i64,
    pub paid_7d: i64,
    pub revenue_7d: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalsKpi {
    pub checked_out: i64,
    pub overdue: i64,
    pub due_soon: i64,
    pub revenue_7d: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagesKpi {
    pub active: i64,
    pub paid_7d: i64,
    pub revenue_7d: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsKpi {
    pub total: i64,
    pub new_7d: i64,
    /// Month-to-date average rating, two decimals.
    pub average_rating: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsKpi {
    pub granted_month: i64,
    pub spent_month: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityKpi {
    pub posts_7d: i64,
    pub reports_pending: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryKpi {
    pub low_stock: i64,
    pub out_of_stock: i64,
}

/// Scalar queue cardinalities; the capped detail lists live in
/// `queue_details`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub payment_pending: i64,
    pub cancel_requested: i64,
    pub shipping_pending: i64,
    pub rental_overdue: i64,
    pub rental_due_soon: i64,
    pub aging_applications: i64,
    pub pass_expiring: i64,
    pub notifications_pending: i64,
    pub notifications_failed: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistBlock {
    pub order_status: BTreeMap<String, i64>,
    pub order_payment: BTreeMap<String, i64>,
    pub application_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlert {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub stock_quantity: i64,
    pub status: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBlock {
    pub products: Vec<TopProduct>,
    pub brands: Vec<TopBrand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub quantity: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBrand {
    pub brand: String,
    pub quantity: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDetailsBlock {
    pub payment_pending: Vec<QueueItem>,
    pub cancel_requested: Vec<QueueItem>,
    pub shipping_pending: Vec<QueueItem>,
    pub rental_overdue: Vec<QueueItem>,
    pub rental_due_soon: Vec<QueueItem>,
    pub aging_applications: Vec<QueueItem>,
    pub pass_expiring: Vec<QueueItem>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentBlock {
    pub orders: Vec<RecentOrder>,
    pub applications: Vec<RecentApplication>,
    pub reviews: Vec<RecentReview>,
    pub signups: Vec<RecentSignup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: String,
    pub display_name: String,
    pub amount: i64,
    pub status: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentApplication {
    pub id: String,
    pub display_name: String,
    pub status: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReview {
    pub id: String,
    pub display_name: String,
    pub product_name: String,
    pub rating: i64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSignup {
    pub id: String,
    pub display_name: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementsBlock {
    pub current: SettlementArtifact,
    pub previous: SettlementArtifact,
}

/// Existence of the monthly settlement artifact, an external state
/// check; this engine never computes one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementArtifact {
    pub month: String,
    pub present: bool,
}

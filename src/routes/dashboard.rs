use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::auth::require_admin;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::metrics::snapshot::RECOMMENDED_MAX_AGE_SECS;
use crate::state::AppState;

const DASHBOARD_CACHE_KEY: &str = "admin_dashboard";

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/admin/dashboard",
        axum::routing::get(admin_dashboard),
    )
}

/// One read path for the whole admin dashboard.
///
/// The snapshot is rebuilt at most once per freshness window; requests
/// inside the window are served from the in-process cache. A failed
/// build surfaces as a single error response, never a partially
/// populated dashboard.
async fn admin_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    require_admin(&state, &headers)?;

    if let Some(cached) = state.dashboard_cache.get(DASHBOARD_CACHE_KEY).await {
        return Ok(respond(cached));
    }

    let pool = state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })?;

    let snapshot = metrics::build_snapshot(pool).await?;
    let payload = Arc::new(
        serde_json::to_value(&snapshot)
            .map_err(|error| AppError::Internal(format!("Snapshot serialization failed: {error}")))?,
    );

    state
        .dashboard_cache
        .insert(DASHBOARD_CACHE_KEY.to_string(), payload.clone())
        .await;

    Ok(respond(payload))
}

fn respond(payload: Arc<Value>) -> Response {
    let mut response = Json(payload.as_ref().clone()).into_response();
    // The engine recommends its freshness window; the cache store and
    // any rate limiting live outside it.
    let directive = format!("private, max-age={RECOMMENDED_MAX_AGE_SECS}");
    if let Ok(value) = HeaderValue::from_str(&directive) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

//! `/health` and `/metrics`. Health checks both stores with a
//! cheap round-trip so a load balancer can evict an instance that has
//! lost its database or cache before user traffic does.

use crate::context::AppContext;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct DependencyStatus {
    pub ok: bool,
    pub detail: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: DependencyStatus,
    pub cache: DependencyStatus,
}

pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    let database = match ctx.db.get_user_by_id(crate::ids::UserId::new()).await {
        Ok(_) => DependencyStatus { ok: true, detail: None },
        Err(e) => DependencyStatus { ok: false, detail: Some(e.to_string()) },
    };
    let cache = match ctx.cache.get_raw("health:probe").await {
        Ok(_) => DependencyStatus { ok: true, detail: None },
        Err(e) => DependencyStatus { ok: false, detail: Some(e.to_string()) },
    };
    let status = if database.ok && cache.ok { "ok" } else { "degraded" };
    Json(HealthResponse { status, database, cache })
}

pub async fn metrics(State(ctx): State<AppContext>) -> Json<crate::metrics::MetricsSnapshot> {
    Json(ctx.metrics.snapshot())
}

//! Router assembly. One handler module per resource, a
//! shared `AppContext` as axum state, request-scoped deadlines via
//! `tower_http::timeout`, and a tracing span per request carrying
//! method/path/status/latency.

pub mod handlers;
pub mod middleware;
pub mod ws;

use crate::context::AppContext;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);
const COMBAT_START_DEADLINE: Duration = Duration::from_secs(30);

pub fn build_router(ctx: AppContext) -> Router {
    let cors = middleware::cors_layer(&ctx.config.cors_origins);

    let combat_start_routes = Router::new()
        .route("/api/combat/start", post(handlers::combat::start))
        .layer(TimeoutLayer::new(COMBAT_START_DEADLINE));

    let routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/character/list", get(handlers::character::list))
        .route("/api/character/create", post(handlers::character::create))
        .route("/api/character/:id", get(handlers::character::get).delete(handlers::character::delete))
        .route("/api/character/:id/allocate", post(handlers::character::allocate_stats))
        .route("/api/character/:id/equip", post(handlers::character::equip))
        .route("/api/character/:id/unequip", post(handlers::character::unequip))
        .route("/api/character/:id/loadout", post(handlers::character::set_loadout))
        .route("/api/character/:id/history", get(handlers::combat::history))
        .route("/api/combat/:id", get(handlers::combat::get))
        .route("/api/combat/:id/action", post(handlers::combat::submit))
        .route("/api/combat/:id/ws", get(ws::combat_ws))
        .route("/api/autofight/:character_id", delete(handlers::combat::cancel_autofight))
        .route("/api/autofight/:character_id/poll", post(handlers::combat::poll_autofight))
        .route("/api/pvp/queue", post(handlers::pvp::enqueue).delete(handlers::pvp::cancel))
        .route("/api/pvp/queue/status", get(handlers::pvp::status))
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::health::metrics))
        .layer(TimeoutLayer::new(DEFAULT_DEADLINE));

    Router::new()
        .merge(routes)
        .merge(combat_start_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(ctx.clone(), record_request))
        .with_state(ctx)
}

async fn record_request(
    axum::extract::State(ctx): axum::extract::State<AppContext>,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    ctx.metrics.record_request();
    if let Err(e) = ctx.rate_limiters.check_global(addr.ip()) {
        return e.into_response();
    }
    next.run(request).await
}

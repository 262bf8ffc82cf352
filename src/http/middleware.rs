//! Request-scoped auth extraction and the CORS layer. `AuthUser` is an
//! axum `FromRequestParts` extractor that validates the bearer token
//! once per request and hands every authenticated handler an
//! already-checked user id as a plain argument.

use crate::auth::token::{validate_token, TokenUse};
use crate::context::AppContext;
use crate::error::AppError;
use crate::ids::UserId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// The caller's identity, resolved from a validated `Bearer` access
/// token. Handlers that need the current user take this as a plain
/// extractor argument.
pub struct AuthUser(pub UserId);

#[async_trait::async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(axum::http::header::AUTHORIZATION).ok_or(AppError::Unauthenticated)?;
        let value = header.to_str().map_err(|_| AppError::Unauthenticated)?;
        let token = value.strip_prefix("Bearer ").ok_or(AppError::Unauthenticated)?;
        let claims = validate_token(token, &ctx.config.jwt_secret_ring, TokenUse::Access)?;
        Ok(AuthUser(claims.sub))
    }
}

/// `*` is rejected in production at config-load time (`AppConfig::load`),
/// so by the time this layer is built the allow-list is already safe to
/// honor verbatim.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new();
    }
    let allowed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

//! The single injected dependency bundle: no global singletons for
//! DB/cache clients, just one cloneable `Arc`-backed `AppContext`
//! threaded through every handler and background task via axum's
//! `State` extractor.

use crate::auth::RateLimiters;
use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::store::ephemeral::traits::EphemeralStore;
use crate::store::persistence::traits::Persistence;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: Arc<dyn Persistence>,
    pub cache: Arc<dyn EphemeralStore>,
    pub rate_limiters: Arc<RateLimiters>,
    pub metrics: Arc<Metrics>,
}

impl AppContext {
    pub async fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        let db = crate::store::persistence::connect(&config.database_url).await?;
        let cache = crate::store::ephemeral::connect(config.cache_url.as_deref()).await?;
        let rate_limiters = Arc::new(RateLimiters::from_config(&config.rate_limits));
        Ok(Self { config: Arc::new(config), db, cache, rate_limiters, metrics: Arc::new(Metrics::default()) })
    }
}

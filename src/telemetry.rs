//! Structured logging setup: `tracing` +
//! `tracing-subscriber` with an env-filter, JSON output in production
//! and human-readable output in development.

use crate::config::Environment;

pub fn init(environment: Environment) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if environment.is_production() {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

//! Environment-driven configuration, loaded once at startup into an
//! immutable snapshot: env vars plus `.env` in development, fail-fast
//! on missing secrets in production.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub struct TtlConfig {
    pub combat: Duration,
    pub autofight: Duration,
    pub queue: Duration,
    pub session: Duration,
    pub idempotency: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            combat: Duration::from_secs(3600),
            autofight: Duration::from_secs(1800),
            queue: Duration::from_secs(120),
            session: Duration::from_secs(300),
            idempotency: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub global_per_hour: u32,
    pub register_per_min: u32,
    pub login_per_min: u32,
    pub combat_start_per_min: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_hour: 1000,
            register_per_min: 5,
            login_per_min: 10,
            combat_start_per_min: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub jwt_secret: Vec<u8>,
    pub jwt_secret_ring: Vec<Vec<u8>>,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub cache_url: Option<String>,
    pub ttl: TtlConfig,
    pub rate_limits: RateLimitConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment (optionally
    /// populated from a `.env` file). Fails fast: a misconfigured
    /// production deployment should never boot partially configured.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Environment::parse(&env_or("ENVIRONMENT", "development"));

        let jwt_secret = env_or("JWT_SECRET", "").into_bytes();
        if environment.is_production() && jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 bytes in production");
        }
        let jwt_secret = if jwt_secret.is_empty() {
            // Development-only fallback so the server is runnable without ceremony.
            b"idleduelist-development-secret-key-not-for-prod".to_vec()
        } else {
            jwt_secret
        };

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if environment.is_production() && cors_origins.iter().any(|o| o == "*") {
            anyhow::bail!("CORS_ORIGINS may not contain '*' in production");
        }

        let database_url = env_or("DATABASE_URL", "sqlite://idleduelist.db");
        let cache_url = std::env::var("CACHE_URL").ok();

        let port: u16 = env_or("PORT", "8000")
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?;

        let mut ttl = TtlConfig::default();
        if let Some(v) = env_duration_secs("COMBAT_STATE_TTL") {
            ttl.combat = v;
        }
        if let Some(v) = env_duration_secs("QUEUE_TTL") {
            ttl.queue = v;
        }
        if let Some(v) = env_duration_secs("SESSION_TTL") {
            ttl.session = v;
        }

        Ok(Self {
            environment,
            port,
            jwt_secret_ring: vec![jwt_secret.clone()],
            jwt_secret,
            cors_origins,
            database_url,
            cache_url,
            ttl,
            rate_limits: RateLimitConfig::default(),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_duration_secs(key: &str) -> Option<Duration> {
    std::env::var(key).ok()?.parse::<u64>().ok().map(Duration::from_secs)
}

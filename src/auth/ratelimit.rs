//! Per-IP/per-user rate limiting: one keyed `governor` limiter per
//! bucket.

use crate::config::RateLimitConfig;
use crate::error::AppError;
use governor::clock::Clock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::IpAddr;
use std::num::NonZeroU32;

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, governor::clock::DefaultClock>;

pub struct RateLimiters {
    pub global: KeyedLimiter,
    pub register: KeyedLimiter,
    pub login: KeyedLimiter,
    pub combat_start: KeyedLimiter,
}

fn quota_per_hour(n: u32) -> Quota {
    Quota::per_hour(NonZeroU32::new(n.max(1)).unwrap())
}

fn quota_per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n.max(1)).unwrap())
}

impl RateLimiters {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            global: RateLimiter::keyed(quota_per_hour(config.global_per_hour)),
            register: RateLimiter::keyed(quota_per_minute(config.register_per_min)),
            login: RateLimiter::keyed(quota_per_minute(config.login_per_min)),
            combat_start: RateLimiter::keyed(quota_per_minute(config.combat_start_per_min)),
        }
    }

    pub fn check_global(&self, ip: IpAddr) -> Result<(), AppError> {
        check(&self.global, ip)
    }

    pub fn check_register(&self, ip: IpAddr) -> Result<(), AppError> {
        check(&self.register, ip)
    }

    pub fn check_login(&self, ip: IpAddr) -> Result<(), AppError> {
        check(&self.login, ip)
    }

    pub fn check_combat_start(&self, ip: IpAddr) -> Result<(), AppError> {
        check(&self.combat_start, ip)
    }
}

fn check(limiter: &KeyedLimiter, ip: IpAddr) -> Result<(), AppError> {
    limiter.check_key(&ip).map_err(|not_until| {
        let retry_after_seconds = not_until.wait_time_from(governor::clock::DefaultClock::default().now()).as_secs();
        AppError::RateLimited { retry_after_seconds: retry_after_seconds.max(1) }
    })
}

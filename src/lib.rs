pub mod auth;
pub mod combat;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod ids;
pub mod matchmaking;
pub mod metrics;
pub mod models;
pub mod pve;
pub mod stats;
pub mod store;
pub mod sweepers;
pub mod telemetry;

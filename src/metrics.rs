//! In-memory counters backing `/metrics`. No external metrics crate —
//! plain atomics, snapshotted every 10s by the metrics sweeper into the
//! `/metrics` endpoint's view.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    pub requests_total: AtomicU64,
    pub combats_started: AtomicU64,
    pub combats_finished: AtomicU64,
    pub pvp_queue_depth: AtomicU64,
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub combats_started: u64,
    pub combats_finished: u64,
    pub pvp_queue_depth: u64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            combats_started: self.combats_started.load(Ordering::Relaxed),
            combats_finished: self.combats_finished.load(Ordering::Relaxed),
            pvp_queue_depth: self.pvp_queue_depth.load(Ordering::Relaxed),
        }
    }

    pub fn set_queue_depth(&self, depth: u64) {
        self.pvp_queue_depth.store(depth, Ordering::Relaxed);
    }

    pub fn record_combat_started(&self) {
        self.combats_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_combat_finished(&self) {
        self.combats_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }
}

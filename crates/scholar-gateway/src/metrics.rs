//! Gateway counters, exposed as JSON at `/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct GatewayMetrics {
    pub requests: AtomicU64,
    pub rewrites: AtomicU64,
    pub state_updates: AtomicU64,
    pub payload_lookups: AtomicU64,
    pub payload_cache_hits: AtomicU64,
    pub schedule_shortcuts: AtomicU64,
    pub backend_errors: AtomicU64,
}

impl GatewayMetrics {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": self.requests.load(Ordering::Relaxed),
            "rewrites": self.rewrites.load(Ordering::Relaxed),
            "state_updates": self.state_updates.load(Ordering::Relaxed),
            "payload_lookups": self.payload_lookups.load(Ordering::Relaxed),
            "payload_cache_hits": self.payload_cache_hits.load(Ordering::Relaxed),
            "schedule_shortcuts": self.schedule_shortcuts.load(Ordering::Relaxed),
            "backend_errors": self.backend_errors.load(Ordering::Relaxed),
        })
    }
}

//! Request outcome counters and the decorator that maintains them.
//!
//! The counters are plain `prometheus_client` counters, so increments are
//! lock-free atomic adds and every clone of [`RequestMetrics`] observes the
//! same values.
mod decorator;

pub use decorator::{MetricsDecorator, Unbound};

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

/// Point-in-time copy of the request counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub errors: u64,
    pub successes: u64,
}

/// Process-wide request counters: total, failed and successful lookups.
///
/// Created zeroed at startup and never reset.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    total: Counter,
    errors: Counter,
    successes: Counter,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the counters. Exposition appends `_total` to each name.
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "requests",
            "How many requests received",
            self.total.clone(),
        );
        registry.register(
            "requests_err",
            "How many requests failed",
            self.errors.clone(),
        );
        registry.register(
            "requests_ok",
            "How many requests were successful",
            self.successes.clone(),
        );
    }

    pub fn total(&self) -> u64 {
        self.total.get()
    }

    pub fn errors(&self) -> u64 {
        self.errors.get()
    }

    pub fn successes(&self) -> u64 {
        self.successes.get()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total: self.total(),
            errors: self.errors(),
            successes: self.successes(),
        }
    }

    fn record_request(&self) {
        self.total.inc();
    }

    fn record_outcome(&self, succeeded: bool) {
        if succeeded {
            self.successes.inc();
        } else {
            self.errors.inc();
        }
    }
}

//! Prometheus metrics for the facade.

use std::sync::atomic::AtomicI64;

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MethodLabel {
    pub method: String,
}

/// Facade-level gauges and counters. Cloning shares the underlying values.
#[derive(Debug, Clone, Default)]
pub struct FacadeMetrics {
    /// Filters currently installed.
    pub installed_filters: Gauge<i64, AtomicI64>,
    /// Push subscriptions currently open.
    pub open_subscriptions: Gauge<i64, AtomicI64>,
    /// Calls answered from the fixed stub table, by method.
    pub stub_calls: Family<MethodLabel, Counter>,
}

impl FacadeMetrics {
    /// Create metrics and register them with `registry`.
    pub fn register(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "ethcompat_installed_filters",
            "Number of installed polling filters",
            metrics.installed_filters.clone(),
        );
        registry.register(
            "ethcompat_open_subscriptions",
            "Number of open push subscriptions",
            metrics.open_subscriptions.clone(),
        );
        registry.register(
            "ethcompat_stub_calls",
            "Calls answered with a fixed value because the chain lacks the concept",
            metrics.stub_calls.clone(),
        );
        metrics
    }

    pub fn record_stub_call(&self, method: &str) {
        self.stub_calls
            .get_or_create(&MethodLabel {
                method: method.to_string(),
            })
            .inc();
    }
}

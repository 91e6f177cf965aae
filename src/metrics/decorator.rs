/// Outcome-counting wrapper around any `BalanceProvider`
use super::RequestMetrics;
use crate::context::RequestContext;
use crate::services::{BalanceError, BalanceProvider};
use crate::types::Balance;
use async_trait::async_trait;

/// Placeholder target of a decorator that has not been bound yet
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Counts every lookup passing through it and forwards the call unchanged.
///
/// Built unbound with [`MetricsDecorator::new`] and attached to its target with
/// [`MetricsDecorator::wrap`]; only a bound decorator is a `BalanceProvider`.
#[derive(Debug, Clone)]
pub struct MetricsDecorator<P = Unbound> {
    metrics: RequestMetrics,
    inner: P,
}

impl MetricsDecorator<Unbound> {
    pub fn new(metrics: RequestMetrics) -> Self {
        Self {
            metrics,
            inner: Unbound,
        }
    }

    /// Bind the provider whose calls are counted
    pub fn wrap<P: BalanceProvider>(self, inner: P) -> MetricsDecorator<P> {
        MetricsDecorator {
            metrics: self.metrics,
            inner,
        }
    }
}

/// Records the outcome when dropped. A call that never reports success,
/// because it panicked or its future was dropped, counts as an error.
struct OutcomeGuard<'a> {
    metrics: &'a RequestMetrics,
    succeeded: bool,
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_outcome(self.succeeded);
    }
}

#[async_trait]
impl<P: BalanceProvider> BalanceProvider for MetricsDecorator<P> {
    async fn get_balance(
        &self,
        ctx: &RequestContext,
        address: &str,
    ) -> Result<Balance, BalanceError> {
        self.metrics.record_request();
        let mut guard = OutcomeGuard {
            metrics: &self.metrics,
            succeeded: false,
        };

        let result = self.inner.get_balance(ctx, address).await;
        guard.succeeded = result.is_ok();
        result
    }
}

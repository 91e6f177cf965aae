/// Provider module - abstracts the node's RPC interface
/// Clean interface for dependency injection and testing
mod ethereum;

pub use ethereum::AlloyBalanceBackend;

use crate::context::RequestContext;
use crate::types::{AccountAddress, Balance};
use async_trait::async_trait;
use mockall::automock;
use std::sync::Arc;

/// Remote capability reporting the balance of an account.
///
/// Implementations are shared across all in-flight requests and must not keep
/// per-call mutable state.
#[automock]
#[async_trait]
pub trait BalanceBackend: Send + Sync {
    /// Balance of `address` at the latest block
    async fn get_balance(
        &self,
        ctx: &RequestContext,
        address: AccountAddress,
    ) -> anyhow::Result<Balance>;
}

/// Provider factory for dependency injection
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create production balance backend over HTTP JSON-RPC
    pub fn create_balance_backend(
        rpc_url: &str,
        request_timeout_seconds: u64,
    ) -> anyhow::Result<Arc<dyn BalanceBackend>> {
        let backend = AlloyBalanceBackend::new(rpc_url, request_timeout_seconds)?;
        Ok(Arc::new(backend))
    }

    /// Create mock backend for testing
    #[cfg(test)]
    pub fn create_mock_backend() -> MockBalanceBackend {
        MockBalanceBackend::new()
    }
}

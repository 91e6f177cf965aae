/// Alloy-based balance backend
/// Issues `eth_getBalance` against a JSON-RPC node over HTTP
use super::BalanceBackend;
use crate::context::RequestContext;
use crate::types::{AccountAddress, Balance};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Alloy-based JSON-RPC client shared by every in-flight request
pub struct AlloyBalanceBackend<T> {
    provider: RootProvider<T>,
    request_timeout: Duration,
}

impl AlloyBalanceBackend<Http<Client>> {
    /// Create a backend for `rpc_url`. No connection is made until the first call.
    #[instrument(skip(rpc_url))]
    pub fn new(rpc_url: &str, request_timeout_seconds: u64) -> anyhow::Result<Self> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid RPC endpoint '{}': {}", rpc_url, e))?;
        let provider = ProviderBuilder::new().on_http(url);

        info!("Balance backend initialized");
        Ok(Self {
            provider,
            request_timeout: Duration::from_secs(request_timeout_seconds),
        })
    }

    /// Per-call budget: the configured timeout, shortened by the context deadline
    fn call_budget(&self, ctx: &RequestContext) -> Duration {
        match ctx.remaining() {
            Some(remaining) => remaining.min(self.request_timeout),
            None => self.request_timeout,
        }
    }
}

#[async_trait]
impl BalanceBackend for AlloyBalanceBackend<Http<Client>> {
    #[instrument(skip(self, ctx), fields(provider = "http", address = %address))]
    async fn get_balance(
        &self,
        ctx: &RequestContext,
        address: AccountAddress,
    ) -> anyhow::Result<Balance> {
        let budget = self.call_budget(ctx);
        ctx.run(async {
            let balance = tokio::time::timeout(budget, self.provider.get_balance(address))
                .await
                .map_err(|_| anyhow::anyhow!("eth_getBalance timed out after {:?}", budget))??;
            debug!(%balance, "eth_getBalance returned");
            Ok::<_, anyhow::Error>(balance)
        })
        .await
    }
}

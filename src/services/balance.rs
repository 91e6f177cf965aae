/// Balance service implementation
/// Single Responsibility: validate the address, then ask the backend
use crate::context::RequestContext;
use crate::providers::BalanceBackend;
use crate::types::Balance;
use crate::validation::{ValidationError, Validator};
use async_trait::async_trait;
use mockall::automock;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Errors surfaced by a balance lookup
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// Input is not a syntactically valid address. Client fault, never retried.
    #[error("address is not a valid hex format")]
    InvalidAddress(#[source] ValidationError),

    /// The backend call did not complete. Carries the original cause.
    #[error("backend call failed")]
    BackendCallFailed(#[source] anyhow::Error),
}

impl BalanceError {
    pub fn is_invalid_address(&self) -> bool {
        matches!(self, BalanceError::InvalidAddress(_))
    }

    /// The backend failure this error wraps, if any
    pub fn backend_cause(&self) -> Option<&anyhow::Error> {
        match self {
            BalanceError::BackendCallFailed(cause) => Some(cause),
            BalanceError::InvalidAddress(_) => None,
        }
    }
}

/// Balance lookup by address string. Implemented by the plain service and by
/// the metrics decorator so callers can be wired to either.
#[automock]
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_balance(&self, ctx: &RequestContext, address: &str)
        -> Result<Balance, BalanceError>;
}

#[async_trait]
impl<T: BalanceProvider + ?Sized> BalanceProvider for Arc<T> {
    async fn get_balance(
        &self,
        ctx: &RequestContext,
        address: &str,
    ) -> Result<Balance, BalanceError> {
        (**self).get_balance(ctx, address).await
    }
}

pub struct BalanceService {
    backend: Arc<dyn BalanceBackend>,
}

impl BalanceService {
    pub fn new(backend: Arc<dyn BalanceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BalanceProvider for BalanceService {
    #[instrument(skip(self, ctx))]
    async fn get_balance(
        &self,
        ctx: &RequestContext,
        address: &str,
    ) -> Result<Balance, BalanceError> {
        let account = Validator::validate_address(address).map_err(BalanceError::InvalidAddress)?;

        debug!(account = %account, "Fetching balance from backend");
        ctx.run(self.backend.get_balance(ctx, account))
            .await
            .map_err(BalanceError::BackendCallFailed)
    }
}

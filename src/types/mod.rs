/// Domain types for the balance proxy
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Account balance in wei, exactly as reported by the node
pub type Balance = U256;

/// Chain account identifier in canonical (byte) form
pub type AccountAddress = Address;

/// Success payload for a balance lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Balance as a base-10 string, safe for values beyond 64 bits
    pub balance: String,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            balance: balance.to_string(),
        }
    }
}

/// Error payload returned by the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

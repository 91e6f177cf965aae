/// Business logic services
pub mod balance;

// Re-export for convenience
pub use balance::{BalanceError, BalanceProvider, BalanceService};

/// Ethereum balance proxy library
/// Validated balance lookups behind an outcome-counting decorator
use std::fmt;

pub mod context;
pub mod metrics;
pub mod providers;
pub mod server;
pub mod services;
pub mod types;
pub mod validation;

// Re-export key types for public API
pub use context::{CallInterrupted, RequestContext};
pub use metrics::{MetricsDecorator, MetricsSnapshot, RequestMetrics};
pub use providers::{BalanceBackend, ProviderFactory};
pub use services::{BalanceError, BalanceProvider, BalanceService};
pub use types::{AccountAddress, Balance, BalanceResponse};

/// Funded mainnet account used by the liveness probe
pub const DEFAULT_LIVENESS_PROBE_ADDRESS: &str = "0xE5D015A6D172000Cd497F4Fb625Aa48d1c2f7875";

/// Library configuration
#[derive(Clone)]
pub struct Config {
    pub rpc_endpoint: String,
    pub server_host: String,
    pub server_port: u16,
    pub log_level: String,
    // HTTP config
    pub http_timeout_seconds: u64,
    pub http_max_concurrency: usize,
    // Backend config
    pub rpc_request_timeout_seconds: u64,
    // Probes
    pub readiness_timeout_ms: u64,
    pub liveness_probe_address: String,
    pub metrics_prefix: String,
}

// RPC URLs often embed API keys, keep them out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_endpoint", &redact_endpoint(&self.rpc_endpoint))
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("log_level", &self.log_level)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("http_max_concurrency", &self.http_max_concurrency)
            .field("rpc_request_timeout_seconds", &self.rpc_request_timeout_seconds)
            .field("readiness_timeout_ms", &self.readiness_timeout_ms)
            .field("liveness_probe_address", &self.liveness_probe_address)
            .field("metrics_prefix", &self.metrics_prefix)
            .finish()
    }
}

/// Endpoint with credentials and path (where providers put keys) replaced
pub fn redact_endpoint(endpoint: &str) -> String {
    match url::Url::parse(endpoint) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let path = if url.path().len() > 1 { "/[REDACTED]" } else { "" };
            let creds = if url.username().is_empty() && url.password().is_none() {
                ""
            } else {
                "[REDACTED]@"
            };
            format!("{}://{}{}{}{}", url.scheme(), creds, host, port, path)
        }
        Err(_) => "[REDACTED]".to_string(),
    }
}

impl Config {
    /// Create a new Config instance with default tuning (for testing)
    pub fn new(rpc_endpoint: String, server_host: String, server_port: u16, log_level: String) -> Self {
        Self {
            rpc_endpoint,
            server_host,
            server_port,
            log_level,
            http_timeout_seconds: 5,
            http_max_concurrency: 100,
            rpc_request_timeout_seconds: 5,
            readiness_timeout_ms: 1000,
            liveness_probe_address: DEFAULT_LIVENESS_PROBE_ADDRESS.to_string(),
            metrics_prefix: "balance_proxy".to_string(),
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let rpc_endpoint = std::env::var("RPC_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("RPC_ENDPOINT environment variable is required"))?;

        let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid SERVER_PORT value"))?;

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let http_timeout_seconds = std::env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        let http_max_concurrency = std::env::var("HTTP_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let rpc_request_timeout_seconds = std::env::var("RPC_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        let readiness_timeout_ms = std::env::var("READINESS_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1000);

        let liveness_probe_address = std::env::var("LIVENESS_PROBE_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_LIVENESS_PROBE_ADDRESS.to_string());

        let metrics_prefix =
            std::env::var("METRICS_PREFIX").unwrap_or_else(|_| "balance_proxy".to_string());

        Ok(Self {
            rpc_endpoint,
            server_host,
            server_port,
            log_level,
            http_timeout_seconds,
            http_max_concurrency,
            rpc_request_timeout_seconds,
            readiness_timeout_ms,
            liveness_probe_address,
            metrics_prefix,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc_endpoint.is_empty() {
            return Err(anyhow::anyhow!("RPC endpoint cannot be empty"));
        }

        let endpoint = url::Url::parse(&self.rpc_endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid RPC endpoint value: {}", e))?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(anyhow::anyhow!("RPC endpoint must start with http or https"));
        }
        if endpoint.host_str().is_none() {
            return Err(anyhow::anyhow!("RPC endpoint must include a host"));
        }

        if self.server_port == 0 {
            return Err(anyhow::anyhow!("Server port must be greater than 0"));
        }

        if self.http_timeout_seconds == 0 || self.http_timeout_seconds > 300 {
            return Err(anyhow::anyhow!(
                "HTTP timeout must be between 1 and 300 seconds"
            ));
        }
        if self.http_max_concurrency == 0 || self.http_max_concurrency > 10_000 {
            return Err(anyhow::anyhow!(
                "HTTP max concurrency must be between 1 and 10000"
            ));
        }

        if self.rpc_request_timeout_seconds == 0 || self.rpc_request_timeout_seconds > 300 {
            return Err(anyhow::anyhow!(
                "RPC_REQUEST_TIMEOUT_SECONDS must be between 1 and 300"
            ));
        }

        if self.readiness_timeout_ms == 0 || self.readiness_timeout_ms > 60_000 {
            return Err(anyhow::anyhow!(
                "READINESS_TIMEOUT_MS must be between 1 and 60000"
            ));
        }

        if !validation::Validator::is_valid_address(&self.liveness_probe_address) {
            return Err(anyhow::anyhow!(
                "LIVENESS_PROBE_ADDRESS is not a valid address: {}",
                self.liveness_probe_address
            ));
        }

        if self.metrics_prefix.is_empty()
            || !self
                .metrics_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(anyhow::anyhow!(
                "METRICS_PREFIX must be non-empty and contain only [a-zA-Z0-9_]"
            ));
        }

        Ok(())
    }
}

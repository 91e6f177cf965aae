/// Main application entry point
/// Proper dependency injection and graceful shutdown
use eth_balance_proxy::{
    metrics::{MetricsDecorator, RequestMetrics},
    providers::ProviderFactory,
    redact_endpoint,
    server::{AppState, HttpServer, ReadinessProbe},
    services::BalanceService,
    Config,
};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Initialize logging subsystem
pub fn initialize_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}

/// Load and validate configuration
pub fn load_config() -> anyhow::Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

/// Wire backend, services and metrics into the application state
pub fn initialize_services(config: &Config) -> anyhow::Result<(AppState, Registry)> {
    let backend = ProviderFactory::create_balance_backend(
        &config.rpc_endpoint,
        config.rpc_request_timeout_seconds,
    )?;
    info!("Balance backend initialized");

    let service = Arc::new(BalanceService::new(backend));

    let metrics = RequestMetrics::new();
    let mut registry = Registry::default();
    metrics.register(&mut registry);
    let decorated = MetricsDecorator::new(metrics).wrap(service.clone());

    let readiness = ReadinessProbe::from_endpoint(
        &config.rpc_endpoint,
        Duration::from_millis(config.readiness_timeout_ms),
    )?;
    let (probe_host, probe_port) = readiness.target();
    info!(probe_host, probe_port, "Readiness probe configured");

    info!("Services initialized");

    Ok((
        AppState::new(
            Arc::new(decorated),
            service,
            config.liveness_probe_address.clone(),
            readiness,
            Duration::from_secs(config.http_timeout_seconds),
        ),
        registry,
    ))
}

/// Start HTTP server with graceful shutdown
pub async fn start_server(
    config: &Config,
    app_state: AppState,
    registry: Registry,
) -> anyhow::Result<()> {
    let server = HttpServer::new(
        config.server_host.clone(),
        config.server_port,
        app_state,
        registry,
        &config.metrics_prefix,
        config.http_timeout_seconds,
        config.http_max_concurrency,
    )?;

    info!("Starting HTTP server...");
    server.start().await
}

/// Main application logic (extracted for testing)
pub async fn run_application() -> anyhow::Result<()> {
    let config = load_config()?;
    initialize_logging(&config.log_level);
    info!(
        rpc_endpoint = %redact_endpoint(&config.rpc_endpoint),
        host = %config.server_host,
        port = %config.server_port,
        "Configuration loaded"
    );

    let (app_state, registry) = initialize_services(&config)?;

    match start_server(&config, app_state, registry).await {
        Ok(()) => {
            info!("Server shutdown completed");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_application().await
}

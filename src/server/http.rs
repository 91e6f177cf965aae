/// HTTP server implementation with graceful shutdown
/// Clean separation of transport layer from business logic
use crate::context::RequestContext;
use crate::server::monitor::MonitorLayer;
use crate::server::probes::ReadinessProbe;
use crate::services::{BalanceError, BalanceProvider};
use crate::types::{BalanceResponse, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus_client::registry::Registry;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Slack between the request deadline and the outer timeout layer, so an
/// expiring backend call is answered by the handler as a server error rather
/// than cut off by the layer with a 408
const TIMEOUT_LAYER_GRACE: Duration = Duration::from_secs(1);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Decorated lookup serving client requests
    balance_provider: Arc<dyn BalanceProvider>,
    /// Undecorated lookup used by the liveness probe, so probes do not skew request metrics
    liveness_provider: Arc<dyn BalanceProvider>,
    liveness_probe_address: String,
    readiness_probe: ReadinessProbe,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(
        balance_provider: Arc<dyn BalanceProvider>,
        liveness_provider: Arc<dyn BalanceProvider>,
        liveness_probe_address: String,
        readiness_probe: ReadinessProbe,
        request_timeout: Duration,
    ) -> Self {
        Self {
            balance_provider,
            liveness_provider,
            liveness_probe_address,
            readiness_probe,
            request_timeout,
        }
    }
}

/// HTTP server with graceful shutdown
pub struct HttpServer {
    router: Router,
    host: String,
    port: u16,
}

impl HttpServer {
    /// Create new HTTP server. HTTP request metrics are registered under
    /// `metrics_prefix` and the whole registry is served on `/metrics`.
    pub fn new(
        host: String,
        port: u16,
        state: AppState,
        mut registry: Registry,
        metrics_prefix: &str,
        http_timeout_seconds: u64,
        http_max_concurrency: usize,
    ) -> anyhow::Result<Self> {
        if http_max_concurrency == 0 {
            return Err(anyhow::anyhow!("HTTP max concurrency must be at least 1"));
        }

        // handlers own the request deadline; the layer only catches what outlives it
        let layer_timeout = Duration::from_secs(http_timeout_seconds).max(state.request_timeout)
            + TIMEOUT_LAYER_GRACE;

        let monitor_layer = MonitorLayer::new(registry.sub_registry_with_prefix(metrics_prefix));

        let metric_routes = Router::new()
            .route("/", get(metrics))
            .with_state(Arc::new(registry));

        let router = Router::new()
            .route("/eth/balance/:addr", get(get_balance))
            .route("/live", get(liveness))
            .route("/ready", get(readiness))
            .with_state(state)
            .nest("/metrics", metric_routes)
            .route_layer(monitor_layer)
            .layer(ConcurrencyLimitLayer::new(http_max_concurrency))
            .layer(TimeoutLayer::new(layer_timeout))
            .layer(TraceLayer::new_for_http());

        Ok(Self { router, host, port })
    }

    /// Router with all routes and layers, for embedding or tests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind to the configured address and serve until a shutdown signal
    pub async fn start(&self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::time::timeout(Duration::from_secs(5), TcpListener::bind(&addr))
            .await
            .map_err(|_| anyhow::anyhow!("Timeout waiting to bind to {}", addr))?
            .map_err(|e| anyhow::anyhow!("Failed to bind to address {}: {}", addr, e))?;

        info!("Server listening on {}", addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    /// In-flight requests are allowed to finish.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("Server shutdown completed");
        Ok(())
    }
}

/// Errors mapped to HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Balance(err) if err.is_invalid_address() => json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: error_chain(&err),
                },
            ),
            ApiError::Balance(err) => {
                error!(error = %error_chain(&err), "get balance");
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &ErrorResponse {
                        error: "internal error".to_string(),
                    },
                )
            }
        }
    }
}

/// Render an error with all of its causes, outermost first
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Pretty-printed JSON body with the given status
fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_string_pretty(body) {
        Ok(json) => (status, [(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET handler for `/eth/balance/:addr`
#[instrument(skip(state))]
async fn get_balance(
    State(state): State<AppState>,
    Path(addr): Path<String>,
) -> Result<Response, ApiError> {
    let ctx = RequestContext::with_timeout(state.request_timeout);
    let balance = state.balance_provider.get_balance(&ctx, &addr).await?;
    Ok(json_response(StatusCode::OK, &BalanceResponse::from(balance)))
}

/// GET handler for `/live`.
/// Healthy when a known funded account reports a non-zero balance.
async fn liveness(State(state): State<AppState>) -> StatusCode {
    let ctx = RequestContext::with_timeout(state.request_timeout);
    match state
        .liveness_provider
        .get_balance(&ctx, &state.liveness_probe_address)
        .await
    {
        Ok(balance) if !balance.is_zero() => StatusCode::OK,
        Ok(_) => {
            warn!("Liveness probe account reported zero balance");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            warn!(error = %error_chain(&e), "Liveness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET handler for `/ready`.
/// Ready when the RPC endpoint accepts TCP connections.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.readiness_probe.check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET handler for `/metrics`.
/// Exposes the metrics in the registry in the Prometheus format.
async fn metrics(State(registry): State<Arc<Registry>>) -> Result<String, String> {
    let mut buffer = String::new();
    prometheus_client::encoding::text::encode(&mut buffer, &registry)
        .map_err(|err| err.to_string())?;
    Ok(buffer)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

//! Common utilities for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use eth_balance_proxy::{
    metrics::{MetricsDecorator, RequestMetrics},
    server::{AppState, HttpServer, ReadinessProbe},
    AccountAddress, Balance, BalanceBackend, BalanceProvider, BalanceService, RequestContext,
};
use prometheus_client::registry::Registry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const FUNDED_ADDRESS: &str = "0xE5D015A6D172000Cd497F4Fb625Aa48d1c2f7875";

/// Low-level failure a transport might report
#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Backend answering with a fixed result and recording every address it was asked about
pub struct FakeBackend {
    response: Result<u64, String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<AccountAddress>>,
}

impl FakeBackend {
    pub fn returning(balance: u64) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(balance),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<AccountAddress> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceBackend for FakeBackend {
    async fn get_balance(
        &self,
        _ctx: &RequestContext,
        address: AccountAddress,
    ) -> anyhow::Result<Balance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(address);
        match &self.response {
            Ok(balance) => Ok(Balance::from(*balance)),
            Err(message) => Err(TransportError(message.clone()).into()),
        }
    }
}

/// Decorated service over `backend`, plus the counters it maintains
pub fn decorated_service(
    backend: Arc<FakeBackend>,
) -> (MetricsDecorator<BalanceService>, RequestMetrics) {
    let metrics = RequestMetrics::new();
    let service = BalanceService::new(backend);
    (MetricsDecorator::new(metrics.clone()).wrap(service), metrics)
}

/// A server running on an ephemeral port, stopped when dropped
pub struct TestServer {
    pub base_url: String,
    pub metrics: RequestMetrics,
    shutdown: Option<oneshot::Sender<()>>,
    _rpc_listener: std::net::TcpListener,
}

impl TestServer {
    pub async fn start(backend: Arc<FakeBackend>) -> anyhow::Result<Self> {
        let metrics = RequestMetrics::new();
        let mut registry = Registry::default();
        metrics.register(&mut registry);

        let service = Arc::new(BalanceService::new(backend));
        let decorated = MetricsDecorator::new(metrics.clone()).wrap(service.clone());

        // readiness target: a listener that stays open for the test's lifetime
        let rpc_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let rpc_port = rpc_listener.local_addr()?.port();

        let state = AppState::new(
            Arc::new(decorated),
            service as Arc<dyn BalanceProvider>,
            FUNDED_ADDRESS.to_string(),
            ReadinessProbe::new("127.0.0.1".to_string(), rpc_port, Duration::from_secs(1)),
            Duration::from_secs(5),
        );
        let server = HttpServer::new(
            "127.0.0.1".to_string(),
            0,
            state,
            registry,
            "balance_proxy",
            5,
            100,
        )?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = server
                .serve(listener, async move {
                    let _ = rx.await;
                })
                .await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            metrics,
            shutdown: Some(tx),
            _rpc_listener: rpc_listener,
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<reqwest::Response> {
        Ok(reqwest::get(format!("{}{}", self.base_url, path)).await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

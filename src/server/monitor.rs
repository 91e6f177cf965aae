//! tower layer recording per-route request durations.
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{family::Family, histogram},
    registry::Registry,
};
use std::{future::Future, pin::Pin, task};

/// tower layer adding monitoring to a service.
#[derive(Debug, Clone)]
pub struct MonitorLayer {
    /// Metric tracking the response status code and response duration.
    requests: Family<RouteLabels, histogram::Histogram>,
}

impl MonitorLayer {
    pub fn new(registry: &mut Registry) -> Self {
        let requests: Family<RouteLabels, _> = Family::new_with_constructor(|| {
            histogram::Histogram::new(histogram::exponential_buckets(0.005, 2.0, 12))
        });
        registry.register(
            "http_request_duration_seconds",
            "Duration of seconds for responding to HTTP requests",
            requests.clone(),
        );
        Self { requests }
    }
}

impl<S> tower::Layer<S> for MonitorLayer {
    type Service = MonitorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MonitorService {
            inner,
            metrics: self.clone(),
        }
    }
}

/// Service middleware tracking metrics.
#[derive(Debug, Clone)]
pub struct MonitorService<S> {
    inner: S,
    metrics: MonitorLayer,
}

/// Labels for the request duration histogram. The route template is used
/// rather than the raw path so addresses do not become label values.
#[derive(Debug, Clone, EncodeLabelSet, PartialEq, Eq, Hash)]
pub struct RouteLabels {
    route: String,
    status: Option<u16>,
}

impl<S, R, ResBody, F> tower::Service<Request<R>> for MonitorService<S>
where
    S: tower::Service<Request<R>, Response = Response<ResBody>, Future = F>,
    F: Future<Output = Result<S::Response, S::Error>> + 'static + Send,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut task::Context<'_>) -> task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<R>) -> Self::Future {
        let start = tokio::time::Instant::now();
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| "unmatched".to_owned());
        let inner_fut = self.inner.call(req);
        let requests = self.metrics.requests.clone();
        Box::pin(async move {
            let res = inner_fut.await;
            let status = res.as_ref().ok().map(|r| r.status().as_u16());
            requests
                .get_or_create(&RouteLabels { route, status })
                .observe(start.elapsed().as_secs_f64());
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_records_route_template() {
        let mut registry = Registry::default();
        let layer = MonitorLayer::new(&mut registry);
        let app = Router::new()
            .route("/eth/balance/:addr", get(|| async { "ok" }))
            .route_layer(layer);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/eth/balance/0xabc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &registry).unwrap();
        assert!(buffer.contains("route=\"/eth/balance/:addr\""));
        assert!(buffer.contains("status=\"200\""));
        assert!(!buffer.contains("0xabc"));
    }
}

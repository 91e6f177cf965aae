/// HTTP server, probes and request monitoring
/// Clean separation of transport layer
pub mod http;
pub mod monitor;
pub mod probes;

// Re-export for convenience
pub use http::{AppState, HttpServer};
pub use probes::ReadinessProbe;

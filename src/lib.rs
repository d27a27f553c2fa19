pub mod catalog;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;

use std::sync::Arc;
use std::time::Duration;

use config::Config;
use metrics::{MetricsError, MetricsStore};
use middleware::Instrumentation;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Process-wide request metrics, written by the middleware, read by `GET /metrics`.
    pub metrics: Arc<MetricsStore>,

    /// Timing / fault injection / access logging for instrumented routes.
    pub instrumentation: Arc<Instrumentation>,

    /// Artificial latency added by the schedule handler.
    pub extra_delay: Duration,
}

impl AppState {
    pub fn new(instrumentation: Arc<Instrumentation>, extra_delay: Duration) -> Self {
        Self {
            metrics: instrumentation.metrics().clone(),
            instrumentation,
            extra_delay,
        }
    }

    /// Build the metrics store and instrumentation described by `cfg`.
    pub fn from_config(cfg: &Config) -> Result<Self, MetricsError> {
        let metrics = Arc::new(MetricsStore::new(cfg.buckets.clone())?);
        let instrumentation = Arc::new(Instrumentation::new(
            cfg.service.clone(),
            cfg.error_rate,
            metrics,
        ));
        Ok(Self::new(instrumentation, cfg.extra_delay))
    }
}

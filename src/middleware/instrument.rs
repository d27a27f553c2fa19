use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

use super::status::StatusWriter;
use super::trace_context::TraceContext;
use crate::metrics::MetricsStore;

/// Body written when a transient failure is injected.
pub const INJECTED_ERROR_BODY: &str = r#"{"error":"transient error retrieving schedule"}"#;

/// Identity stamped on every access log record.
#[derive(Debug, Clone, Default)]
pub struct ServiceInfo {
    pub name: String,
    pub env: String,
    pub version: String,
}

/// Per-request measurement shared by every instrumented route.
///
/// Times the downstream handler, optionally forces a 500, writes one access
/// log record and folds the outcome into the [`MetricsStore`]. Nothing here
/// can fail the request.
pub struct Instrumentation {
    service: ServiceInfo,
    /// Probability in [0, 1] of overriding the outcome with a 500
    error_rate: f64,
    rng: Mutex<StdRng>,
    metrics: Arc<MetricsStore>,
}

/// Middleware state for one named route.
#[derive(Clone)]
pub struct InstrumentedRoute {
    instrumentation: Arc<Instrumentation>,
    route: Arc<str>,
}

impl Instrumentation {
    pub fn new(service: ServiceInfo, error_rate: f64, metrics: Arc<MetricsStore>) -> Self {
        Self::with_rng(service, error_rate, metrics, StdRng::from_entropy())
    }

    /// Same as [`Instrumentation::new`] with a caller-provided (e.g. seeded) RNG.
    pub fn with_rng(
        service: ServiceInfo,
        error_rate: f64,
        metrics: Arc<MetricsStore>,
        rng: StdRng,
    ) -> Self {
        Self {
            service,
            error_rate: error_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    /// State for `axum::middleware::from_fn_with_state(.., instrument)`.
    pub fn route(self: &Arc<Self>, name: &str) -> InstrumentedRoute {
        InstrumentedRoute {
            instrumentation: self.clone(),
            route: Arc::from(name),
        }
    }

    fn should_inject_fault(&self) -> bool {
        let draw: f64 = self.rng.lock().gen();
        draw < self.error_rate
    }

    pub async fn run(&self, route: &str, req: Request, next: Next) -> Response {
        let start = Instant::now();
        let method = req.method().clone();
        let trace = req.extensions().get::<TraceContext>().cloned();

        let mut writer = StatusWriter::new();
        writer.forward(next.run(req).await);

        // ── Fault injection (one shot, overrides whatever was written) ──
        if self.should_inject_fault() {
            writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            writer.set_content_type("application/json");
            writer.write(INJECTED_ERROR_BODY);
            tracing::debug!(route, "injected transient failure");
        }

        let (trace_id, span_id) = match trace {
            Some(ctx) => (ctx.trace_id_hex(), ctx.span_id_hex()),
            None => (String::new(), String::new()),
        };

        let elapsed = start.elapsed();
        let latency_ms = (elapsed.as_secs_f64() * 100_000.0).round() / 100.0;
        let status = writer.status().as_u16();

        tracing::info!(
            target: "access",
            service = %self.service.name,
            env = %self.service.env,
            version = %self.service.version,
            route,
            method = %method,
            status,
            latency_ms,
            trace_id = %trace_id,
            span_id = %span_id,
            "request completed"
        );

        self.metrics.observe(route, status, elapsed.as_secs_f64());

        writer.into_response()
    }
}

/// `from_fn_with_state` entry point.
pub async fn instrument(
    State(route): State<InstrumentedRoute>,
    req: Request,
    next: Next,
) -> Response {
    route
        .instrumentation
        .run(&route.route, req, next)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http,
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn instrumentation(error_rate: f64, seed: u64) -> Arc<Instrumentation> {
        let metrics = Arc::new(MetricsStore::new(vec![0.05, 0.1, 0.2, 0.5, 1.0]).unwrap());
        Arc::new(Instrumentation::with_rng(
            ServiceInfo {
                name: "available-schedules".into(),
                env: "test".into(),
                version: "1.0.0-test".into(),
            },
            error_rate,
            metrics,
            StdRng::seed_from_u64(seed),
        ))
    }

    fn app(inst: &Arc<Instrumentation>) -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
            .layer(from_fn_with_state(inst.route("/test"), instrument))
    }

    async fn call(app: Router, uri: &str) -> Response {
        app.oneshot(http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn zero_rate_never_fires() {
        let inst = instrumentation(0.0, 7);
        assert!((0..10_000).all(|_| !inst.should_inject_fault()));
    }

    #[test]
    fn full_rate_always_fires() {
        let inst = instrumentation(1.0, 7);
        assert!((0..10_000).all(|_| inst.should_inject_fault()));
    }

    #[test]
    fn seeded_rate_is_close_to_configured() {
        let inst = instrumentation(0.3, 42);
        let fired = (0..10_000).filter(|_| inst.should_inject_fault()).count();
        assert!((2_700..=3_300).contains(&fired), "fired {fired} times");
    }

    #[tokio::test]
    async fn records_handler_status() {
        let inst = instrumentation(0.0, 1);
        let res = call(app(&inst), "/missing").await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(inst.metrics().count("/test", 404), 1);
        assert_eq!(inst.metrics().snapshot().count, 1);
    }

    #[tokio::test]
    async fn injected_fault_overrides_response_once() {
        let inst = instrumentation(1.0, 1);
        let res = call(app(&inst), "/ok").await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()["content-type"], "application/json");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], INJECTED_ERROR_BODY.as_bytes());

        assert_eq!(inst.metrics().count("/test", 500), 1);
        assert_eq!(inst.metrics().count("/test", 200), 0);
        assert_eq!(inst.metrics().snapshot().count, 1);
    }

    #[tokio::test]
    async fn passes_through_untouched_without_fault() {
        let inst = instrumentation(0.0, 1);
        let res = call(app(&inst), "/ok").await;

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"fine");
        assert_eq!(inst.metrics().count("/test", 200), 1);
    }

    #[test]
    fn out_of_range_rate_is_clamped() {
        let inst = instrumentation(7.5, 3);
        assert_eq!(inst.error_rate, 1.0);
        let inst = instrumentation(-1.0, 3);
        assert_eq!(inst.error_rate, 0.0);
    }
}

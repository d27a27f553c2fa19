use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{SpanContext, TraceContextExt};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::collections::HashMap;

pub const TRACEPARENT: &str = "traceparent";

/// Remote span context carried by an inbound request.
///
/// Inserted into request extensions by [`propagate`]; the instrumentation
/// middleware only reads it. Always holds a valid context.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceContext(SpanContext);

/// Read-only view of axum headers for the W3C propagator.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

impl TraceContext {
    /// Parse a bare `traceparent` value.
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let carrier = HashMap::from([(TRACEPARENT.to_string(), value.to_string())]);
        Self::extract(&carrier)
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        Self::extract(&HeaderExtractor(headers))
    }

    /// Malformed, uppercase or all-zero contexts come back as `None`.
    fn extract(carrier: &dyn Extractor) -> Option<Self> {
        let cx = TraceContextPropagator::new().extract(carrier);
        let span = cx.span();
        let sc = span.span_context();
        sc.is_valid().then(|| Self(sc.clone()))
    }

    pub fn span_context(&self) -> &SpanContext {
        &self.0
    }

    pub fn trace_id_hex(&self) -> String {
        self.0.trace_id().to_string()
    }

    pub fn span_id_hex(&self) -> String {
        self.0.span_id().to_string()
    }
}

/// Request middleware: lift the `traceparent` header into a [`TraceContext`]
/// extension. Missing or invalid headers leave the request untouched.
pub async fn propagate(mut req: Request, next: Next) -> Response {
    if let Some(ctx) = TraceContext::from_headers(req.headers()) {
        req.extensions_mut().insert(ctx);
    }
    next.run(req).await
}

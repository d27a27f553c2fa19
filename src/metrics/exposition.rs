use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;

use crate::AppState;

/// Prometheus text format content type.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

// ─── GET /metrics ────────────────────────────────────────────────

/// Pull endpoint for Prometheus-compatible scrapers. No auth.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], state.metrics.render())
}

// ─── Formatting helpers ──────────────────────────────────────────

/// Escape a label value: backslash, double quote and newline.
pub fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Shortest round-trip digits, `%g` layout: plain decimals for exponents
/// in [-4, 6), otherwise `1e-05` / `2.5e+06` with a two-digit exponent.
pub fn format_boundary(b: f64) -> String {
    let sci = format!("{b:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{b}");
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return format!("{b}");
    };

    if (-4..6).contains(&exp) {
        format!("{b}")
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

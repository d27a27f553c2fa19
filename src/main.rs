use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use available_schedules::config::{Config, LogFormat};
use available_schedules::{server, AppState};

#[tokio::main]
async fn main() {
    // ── 1. Configuration ─────────────────────────────────────────
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // ── 2. Logging ───────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cfg.log_format {
        LogFormat::Json => fmt()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).init(),
    }

    // ── 3. Metrics store + shared state ──────────────────────────
    let state = match AppState::from_config(&cfg) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(error = %e, "invalid histogram configuration");
            std::process::exit(2);
        }
    };

    tracing::info!(
        service = %cfg.service.name,
        env = %cfg.service.env,
        version = %cfg.service.version,
        error_rate = cfg.error_rate,
        extra_delay_ms = cfg.extra_delay.as_millis() as u64,
        buckets = ?cfg.buckets,
        "configuration loaded"
    );

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(cfg.listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(listen = %cfg.listen, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(listen = %cfg.listen, "available-schedules starting");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

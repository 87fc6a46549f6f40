//! HTTP Server and Poll Loop Wiring
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 if the last `smtpctl` call succeeded, 503 otherwise
//!
//! # Lifecycle
//!
//! [`start`] builds the registry and tracked fields, binds the listener (a bind
//! failure is fatal), spawns the poll loop and serves until Ctrl-C. On shutdown
//! the poll loop is signalled and awaited.

use crate::config::Config;
use crate::metrics::{MetricRegistry, PrometheusRegistry};
use crate::poller::Poller;
use crate::sampler::CommandSampler;
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

pub async fn start(config: Config) -> anyhow::Result<()> {
    config.validate().context("Invalid configuration")?;

    let interval = config.interval();
    let registry = PrometheusRegistry::new().context("Failed to create metrics registry")?;
    let sampler = CommandSampler::from_config(&config.sampler, interval);
    let poller = Arc::new(
        Poller::new(sampler, registry.clone(), &config.fields, interval)
            .context("Failed to register smtpd metrics")?,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    // Start background polling
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let poll_task = tokio::spawn({
        let poller = poller.clone();
        async move {
            poller
                .run(async move {
                    let _ = stop_rx.changed().await;
                })
                .await;
        }
    });

    let served = axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = stop_tx.send(true);
    if let Err(e) = poll_task.await {
        error!("Poll loop terminated abnormally: {}", e);
    }

    served.context("HTTP server error")
}

/// Routes for any registry implementation.
pub fn router<R>(registry: R) -> Router
where
    R: MetricRegistry + Clone,
{
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler::<R>))
        .route("/health", get(health_handler::<R>))
        .with_state(registry)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>smtpd Exporter</title></head>
<body>
<h1>smtpd Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

pub async fn metrics_handler<R: MetricRegistry>(State(registry): State<R>) -> Response {
    match registry.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

pub async fn health_handler<R: MetricRegistry>(State(registry): State<R>) -> Response {
    if registry.is_up() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "smtpctl unavailable").into_response()
    }
}

//! Server integration tests
//!
//! Tests for HTTP endpoints and server functionality.

use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use smtpd_exporter::config::default_fields;
use smtpd_exporter::metrics::{InMemoryRegistry, MetricRegistry, PrometheusRegistry};
use smtpd_exporter::poller::Poller;
use smtpd_exporter::sampler::StaticSampler;
use smtpd_exporter::server::{health_handler, metrics_handler, root_handler, router};
use std::time::Duration;

/// Helper to create a test registry
fn create_test_registry() -> PrometheusRegistry {
    PrometheusRegistry::new().expect("Failed to create registry")
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    // Given: A registry populated by one poll cycle
    let registry = create_test_registry();
    let poller = Poller::new(
        StaticSampler::with_output(
            "scheduler.delivery.ok=5318\nscheduler.delivery.permfail=972\nscheduler.delivery.tempfail=4\n",
        ),
        registry.clone(),
        &default_fields(),
        Duration::from_secs(1),
    )
    .unwrap();
    poller.collect_values().await.unwrap();

    // When: Scraping /metrics
    let response = metrics_handler(State(registry)).await;

    // Then: Output should be valid Prometheus format
    assert_eq!(response.status(), StatusCode::OK);
    let rendered = body_string(response).await;
    assert!(rendered.contains("# HELP"), "Missing HELP comment");
    assert!(rendered.contains("# TYPE smtpd_delivery_ok counter"));
    assert!(rendered.contains("smtpd_delivery_ok 5318"));
    assert!(rendered.contains("smtpd_delivery_permfail 972"));
    assert!(rendered.contains("smtpd_delivery_tempfail 4"));
    assert!(rendered.contains("smtpd_up 1"), "Missing up metric");
}

#[test]
fn test_metrics_rendering_is_stable() {
    // Given: A registry with the up gauge set
    let registry = create_test_registry();
    registry.set_up(true);

    // When: Rendering the same metrics twice
    let render1 = registry.render().expect("First render failed");
    let render2 = registry.render().expect("Second render failed");

    // Then: Both renderings should be identical
    assert_eq!(render1, render2, "Metrics rendering is not stable");
}

#[tokio::test]
async fn test_health_reflects_last_sample() {
    let registry = create_test_registry();

    // Simulate unhealthy state
    registry.set_up(false);
    let response = health_handler(State(registry.clone())).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Simulate healthy state
    registry.set_up(true);
    let response = health_handler(State(registry)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_handlers_work_with_in_memory_registry() {
    let registry = InMemoryRegistry::new();
    registry.set_up(true);

    let response = metrics_handler(State(registry.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("smtpd_up 1"));

    let response = health_handler(State(registry)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_root_page_links_endpoints() {
    let response = root_handler().await.into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("href=\"/metrics\""));
    assert!(body.contains("href=\"/health\""));
}

#[tokio::test]
async fn test_router_serves_metrics_over_tcp() {
    // Given: The router bound to an ephemeral port
    let registry = create_test_registry();
    registry.set_up(true);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(registry)).await.unwrap();
    });

    // When: Issuing a plain HTTP/1.1 GET
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    // Then: The scrape succeeds
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("smtpd_up 1"));
}

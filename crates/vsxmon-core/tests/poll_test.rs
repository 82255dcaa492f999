#![allow(clippy::unwrap_used)]
// Poll-cycle tests against a mocked VSX using wiremock.

use std::collections::BTreeSet;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vsxmon_core::{CoreError, DeviceConfig, Poller, Report, RetryPolicy};

// ── Helpers ─────────────────────────────────────────────────────────

fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn config(server: &MockServer) -> DeviceConfig {
    let mut config = DeviceConfig::new(
        Url::parse(&server.uri()).unwrap(),
        "monitor",
        SecretString::from("s3cret".to_string()),
    );
    config.timeout = Duration::from_secs(5);
    config.retry = RetryPolicy {
        retries: 0,
        backoff: Duration::ZERO,
    };
    config
}

async fn mount(server: &MockServer, report: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/SSConfig/webresources/stats/{report}")))
        .and(query_param("format", "json"))
        .respond_with(response)
        .mount(server)
        .await;
}

// ── Cycles ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_poll_builds_every_section() {
    let server = MockServer::start().await;
    mount(&server, "resource", ResponseTemplate::new(200).set_body_json(fixture("resource.json"))).await;
    mount(&server, "realtime", ResponseTemplate::new(200).set_body_json(fixture("realtime.json"))).await;
    mount(
        &server,
        "media_server",
        ResponseTemplate::new(200).set_body_json(fixture("media_server.json")),
    )
    .await;

    let poller = Poller::new(config(&server)).unwrap();
    let polled = poller.poll().await;

    assert!(polled.failures.is_empty());
    assert_eq!(polled.metrics.trunks.as_ref().map(|t| t.len()), Some(2));
    assert_eq!(polled.metrics.media_servers.as_ref().map(Vec::len), Some(3));
    assert_eq!(
        polled.metrics.system.as_ref().and_then(|s| s.session_utilization_pct),
        Some(91.1)
    );
}

#[tokio::test]
async fn test_failed_report_only_drops_its_section() {
    let server = MockServer::start().await;
    mount(&server, "resource", ResponseTemplate::new(200).set_body_json(fixture("resource.json"))).await;
    mount(&server, "realtime", ResponseTemplate::new(200).set_body_json(fixture("realtime.json"))).await;
    mount(&server, "media_server", ResponseTemplate::new(503)).await;

    let polled = Poller::new(config(&server)).unwrap().poll().await;

    assert!(polled.metrics.trunks.is_some());
    assert!(polled.metrics.system.is_some());
    assert!(polled.metrics.media_servers.is_none());
    assert_eq!(polled.failures.len(), 1);
    assert_eq!(polled.failures[0].report, Report::MediaServer);
}

#[tokio::test]
async fn test_rejected_credentials_are_reported_per_section() {
    let server = MockServer::start().await;
    for report in ["resource", "realtime", "media_server"] {
        mount(&server, report, ResponseTemplate::new(401)).await;
    }

    let polled = Poller::new(config(&server)).unwrap().poll().await;

    assert_eq!(polled.failures.len(), 3);
    assert!(
        polled
            .failures
            .iter()
            .all(|f| matches!(f.error, CoreError::AuthenticationFailed { .. }))
    );
    assert!(polled.metrics.trunks.is_none());
    assert!(polled.metrics.system.is_none());
}

#[tokio::test]
async fn test_unselected_reports_are_never_requested() {
    let server = MockServer::start().await;
    mount(&server, "realtime", ResponseTemplate::new(200).set_body_json(fixture("realtime.json"))).await;
    Mock::given(method("GET"))
        .and(path("/SSConfig/webresources/stats/resource"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.sections = BTreeSet::from([Report::Realtime]);
    let polled = Poller::new(config).unwrap().poll().await;

    assert!(polled.failures.is_empty());
    assert!(polled.metrics.system.is_some());
    assert!(polled.metrics.trunks.is_none());
    assert!(polled.metrics.media_servers.is_none());
}

#[tokio::test]
async fn test_error_body_with_success_status_is_no_data() {
    let server = MockServer::start().await;
    mount(
        &server,
        "resource",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "session expired" })),
    )
    .await;

    let mut config = config(&server);
    config.sections = BTreeSet::from([Report::Resource]);
    let polled = Poller::new(config).unwrap().poll().await;

    assert!(polled.failures.is_empty());
    assert!(polled.metrics.trunks.is_none());
}

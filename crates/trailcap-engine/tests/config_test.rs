mod common;

use common::*;
use std::io::Write;
use tempfile::NamedTempFile;
use trailcap_engine::config::{ConfigError, ConfigLoader, TrailcapConfig};
use trailcap_engine::correlator::Placement;
use trailcap_engine::session::CaptureSession;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = TrailcapConfig::default();
    assert_eq!(config.correlation.window_ms, 2_000);
    assert_eq!(config.classifier.verification_ttl_ms, 300_000);
    assert_eq!(config.classifier.weak_corroboration_threshold, 5);
    assert_eq!(config.capture.text_snippet_limit, 200);
    assert_eq!(config.capture.html_snippet_limit, 500);
    assert!(config.capture.ignored_resource_types.contains(&"font".to_string()));
    assert_eq!(config.security.password_placeholder, "***PASSWORD_PLACEHOLDER***");
}

#[tokio::test]
async fn test_partial_file_keeps_other_defaults() {
    let file = config_file(
        "correlation:\n  window_ms: 500\nclassifier:\n  profile_patterns: [\"/me$\"]\n",
    );
    let config = ConfigLoader::load_from(file.path()).await.unwrap();

    assert_eq!(config.correlation.window_ms, 500);
    assert_eq!(config.classifier.profile_patterns, vec!["/me$".to_string()]);
    assert_eq!(config.classifier.verification_ttl_ms, 300_000);
    assert_eq!(config.security.email_fields, vec!["email", "e-mail"]);
}

#[tokio::test]
async fn test_empty_file_means_defaults() {
    let file = config_file("  \n");
    let config = ConfigLoader::load(Some(file.path())).await.unwrap();
    assert_eq!(config.correlation.window_ms, 2_000);
}

#[tokio::test]
async fn test_malformed_file_is_reported() {
    let file = config_file("correlation: [1, 2\n");
    let err = ConfigLoader::load_from(file.path()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[tokio::test]
async fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load_from(&dir.path().join("absent.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_invalid_pattern_fails_session_creation() {
    let mut config = TrailcapConfig::default();
    config.classifier.verification_patterns = vec!["verify[".to_string()];
    let err = CaptureSession::new(&config).err().unwrap();
    assert!(matches!(err, ConfigError::Pattern { pattern, .. } if pattern == "verify["));
}

#[tokio::test]
async fn test_configured_window_drives_correlation() {
    let file = config_file("correlation:\n  window_ms: 500\n");
    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    let mut session = CaptureSession::new(&config).unwrap();
    session.start(start_request(0)).unwrap();
    session.record_interaction(click(1_000)).unwrap();

    session.request_started(request("near", 1_499));
    session.request_started(request("far", 1_600));
    assert_eq!(
        session.request_completed(completed("near", 1_700)).unwrap(),
        Placement::Attached(1)
    );
    assert_eq!(
        session.request_completed(completed("far", 1_700)).unwrap(),
        Placement::Standalone(2)
    );
}

#[tokio::test]
async fn test_custom_ignored_types_and_header_filters() {
    let file = config_file(
        "capture:\n  ignored_resource_types: [\"ping\"]\n  filtered_header_prefixes: [\"x-debug\"]\n",
    );
    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    let mut session = CaptureSession::new(&config).unwrap();
    session.start(start_request(0)).unwrap();

    let mut ping = request("ping", 10);
    ping.resource_type = "ping".to_string();
    assert_eq!(
        session.request_started(ping),
        trailcap_engine::network::BeginOutcome::OutOfScope
    );

    let mut image = request("img", 10);
    image.resource_type = "image".to_string();
    assert_eq!(
        session.request_started(image),
        trailcap_engine::network::BeginOutcome::Tracking
    );
    session.request_headers(trailcap_engine::protocol::TransactionHeaders {
        request_id: "img".to_string(),
        headers: vec![
            trailcap_engine::protocol::Header::new("X-Debug-Trace", "1"),
            trailcap_engine::protocol::Header::new("sec-ch-ua", "x"),
        ],
    });
    session.request_completed(completed("img", 20)).unwrap();
    let entry = &session.snapshot()[1];
    match entry {
        trailcap_engine::entries::TimelineEntry::Transaction(txn) => {
            assert_eq!(txn.request_headers.len(), 1);
            assert_eq!(txn.request_headers[0].name, "sec-ch-ua");
            assert!(!txn.is_main_request);
        }
        other => panic!("unexpected entry {:?}", other),
    }
}

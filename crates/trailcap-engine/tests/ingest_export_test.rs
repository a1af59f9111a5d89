mod common;

use common::*;
use std::io::Write;
use tempfile::NamedTempFile;
use trailcap_engine::actor::SessionActor;
use trailcap_engine::entries::TimelineEntry;
use trailcap_engine::export::{
    ExportDocument, ExportError, Exporter, FORMAT_VERSION, JsonFileExporter,
};
use trailcap_engine::formatter::{count_entries, format_timeline};
use trailcap_engine::ingest::{self, IngestError, IngestReport};
use trailcap_engine::protocol::Notification;

const RECORDED: &str = r#"# checkout flow
{"kind":"start","tab_id":7,"initial_url":"https://shop.example/","timestamp":1000}
{"kind":"interaction","tab_id":7,"subtype":"click","url":"https://shop.example/","timestamp":2000,"element":{"tag_name":"BUTTON","id":"buy","id_unique":true,"text":"Buy now"}}
{"kind":"request_started","tab_id":7,"request_id":"41","url":"https://shop.example/api/cart","method":"POST","resource_type":"xmlhttprequest","timestamp":2100,"request_body":{"raw":[{"bytes":"eyJxdHkiOjF9"}]}}
{"kind":"request_headers","request_id":"41","headers":[{"name":"content-type","value":"application/json"},{"name":"sec-ch-ua-platform","value":"Linux"}]}
{"kind":"request_completed","request_id":"41","status":201,"timestamp":2300}

{"kind":"interaction","tab_id":9,"subtype":"click","url":"https://other.example/","timestamp":2400,"element":{"tag_name":"A"}}
{"kind":"navigation","tab_id":7,"url":"https://shop.example/cart","timestamp":2500}
{"kind":"stop"}
"#;

fn recorded_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_parse_line_skips_comments_and_blanks() {
    assert!(ingest::parse_line("").unwrap().is_none());
    assert!(ingest::parse_line("   # note").unwrap().is_none());
    assert!(matches!(
        ingest::parse_line(r#"{"kind":"stop"}"#).unwrap(),
        Some(Notification::Stop)
    ));
    assert!(ingest::parse_line(r#"{"kind":"launch"}"#).is_err());
}

#[tokio::test]
async fn test_replay_file_builds_timeline() {
    let file = recorded_file(RECORDED);
    let mut session = session();
    let report = ingest::replay_file(&mut session, file.path()).await.unwrap();

    assert_eq!(report.notifications, 8);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.recordings.len(), 1);
    assert!(!session.is_recording());

    let recording = &report.recordings[0];
    assert_eq!(recording.domain.as_deref(), Some("shop.example"));
    assert_eq!(recording.entries.len(), 3);

    let click = recording.entries[1].as_interaction().unwrap();
    assert_eq!(click.locator, "#buy");
    assert_eq!(click.text_snippet, "Buy now");
    let txn = &click.associated_transactions[0];
    assert_eq!(txn.response_status, Some(201));
    assert_eq!(
        txn.reconstructed_command,
        "curl 'https://shop.example/api/cart' -X POST -H 'content-type: application/json' --data-binary '{\"qty\":1}'"
    );
    assert!(matches!(&recording.entries[2], TimelineEntry::Navigation(nav) if nav.url == "https://shop.example/cart"));
}

#[test]
fn test_replay_stops_at_malformed_line() {
    let mut session = session();
    let text = "{\"kind\":\"start\",\"tab_id\":7,\"initial_url\":\"https://shop.example/\",\"timestamp\":0}\n{not json}\n";
    let err = ingest::replay_str(&mut session, text).unwrap_err();
    assert!(matches!(err, IngestError::Parse { line: 2, .. }));
    assert!(session.is_recording());
}

#[tokio::test]
async fn test_stream_lines_feeds_actor() {
    let (handle, _task) = SessionActor::spawn(session());
    let input = format!("{}\nnot a notification\n", RECORDED.trim_end());

    let mut report = IngestReport::default();
    ingest::stream_lines(input.as_bytes(), &handle, &mut report)
        .await
        .unwrap();
    assert_eq!(report.malformed, 1);
    assert_eq!(report.notifications, 8);
    assert_eq!(report.recordings.len(), 1);
    assert_eq!(report.recordings[0].entries.len(), 3);
    assert!(!handle.status().await.unwrap().recording);
}

#[tokio::test]
async fn test_stream_lines_keeps_line_order_across_kinds() {
    let (handle, _task) = SessionActor::spawn(session());
    let input = r#"{"kind":"start","tab_id":7,"initial_url":"https://shop.example/","timestamp":0}
{"kind":"navigation","tab_id":7,"url":"https://shop.example/a","timestamp":100}
{"kind":"interaction","tab_id":7,"subtype":"click","url":"https://shop.example/a","timestamp":200,"element":{"tag_name":"BUTTON","id":"buy","id_unique":true}}
{"kind":"request_started","tab_id":7,"request_id":"r1","url":"https://shop.example/api/cart","method":"POST","resource_type":"xmlhttprequest","timestamp":300}
{"kind":"request_completed","request_id":"r1","status":200,"timestamp":400}
{"kind":"interaction","tab_id":7,"subtype":"click","url":"https://shop.example/a","timestamp":60000,"element":{"tag_name":"BUTTON","id":"buy","id_unique":true}}
{"kind":"stop"}
"#;

    let mut report = IngestReport::default();
    ingest::stream_lines(input.as_bytes(), &handle, &mut report)
        .await
        .unwrap();
    assert_eq!(report.recordings.len(), 1);

    let entries = &report.recordings[0].entries;
    let timestamps: Vec<_> = entries.iter().map(TimelineEntry::timestamp).collect();
    assert_eq!(timestamps, vec![0, 100, 200, 60_000]);
    assert!(matches!(&entries[1], TimelineEntry::Navigation(nav) if nav.url == "https://shop.example/a"));

    let earlier = entries[2].as_interaction().unwrap();
    assert_eq!(earlier.associated_transactions.len(), 1);
    assert_eq!(earlier.associated_transactions[0].transaction_id, "r1");
    assert!(entries[3].as_interaction().unwrap().associated_transactions.is_empty());
}

#[tokio::test]
async fn test_export_round_trips_through_directory() {
    let mut session = session();
    let mut report = ingest::replay_str(&mut session, RECORDED).unwrap();
    let document = ExportDocument::from(report.recordings.remove(0));
    assert_eq!(document.format_version, FORMAT_VERSION);
    assert_eq!(document.default_file_name(), "trailcap_shop.example_1000.json");

    let dir = tempfile::tempdir().unwrap();
    let exporter = JsonFileExporter::into_directory(dir.path().join("exports"));
    let path = exporter.export(&document).await.unwrap();
    assert_eq!(path, dir.path().join("exports").join("trailcap_shop.example_1000.json"));

    let text = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(text.contains("\"associatedTransactions\""));
    assert!(text.contains("\"type\": \"interaction\""));
    assert!(text.contains("\"formatVersion\": 1"));

    let loaded = ExportDocument::read_from(&path).await.unwrap();
    assert_eq!(loaded, document);
}

#[tokio::test]
async fn test_export_to_fixed_file() {
    let mut session = session();
    let mut report = ingest::replay_str(&mut session, RECORDED).unwrap();
    let document = ExportDocument::from(report.recordings.remove(0));

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("run.json");
    let path = JsonFileExporter::to_file(&target)
        .export(&document)
        .await
        .unwrap();
    assert_eq!(path, target);
    assert!(target.exists());
}

#[test]
fn test_unknown_format_version_is_rejected() {
    let text = r#"{"formatVersion":99,"tabId":1,"initialUrl":"https://a.example/","startedAt":0,"entries":[]}"#;
    assert!(matches!(
        ExportDocument::from_json(text),
        Err(ExportError::UnsupportedVersion(99))
    ));
}

#[test]
fn test_format_timeline_lists_entries() {
    let mut session = session();
    let report = ingest::replay_str(&mut session, RECORDED).unwrap();
    let entries = &report.recordings[0].entries;

    let counts = count_entries(entries);
    assert_eq!(counts.navigations, 2);
    assert_eq!(counts.interactions, 1);
    assert_eq!(counts.attached_transactions, 1);
    assert_eq!(counts.standalone_transactions, 0);

    let text = format_timeline(entries);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "[0] +0ms navigate https://shop.example/");
    assert_eq!(lines[2], "[1] +1000ms click #buy");
    assert_eq!(
        lines[3],
        "      -> POST https://shop.example/api/cart 201 (xmlhttprequest, 200ms)"
    );
    assert_eq!(lines[4], "[2] +1500ms navigate https://shop.example/cart");
}

use anyhow::{Context, bail};
use std::path::Path;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};
use trailcap_engine::actor::{SessionActor, SessionHandle};
use trailcap_engine::config::TrailcapConfig;
use trailcap_engine::export::{ExportDocument, Exporter, JsonFileExporter};
use trailcap_engine::formatter::format_timeline;
use trailcap_engine::ingest::{self, IngestReport};
use trailcap_engine::session::{CaptureSession, FinishedRecording};

pub async fn replay(
    config: &TrailcapConfig,
    file: &Path,
    output: Option<&Path>,
    summary: bool,
) -> anyhow::Result<()> {
    let mut session = CaptureSession::new(config)?;
    let mut report = ingest::replay_file(&mut session, file)
        .await
        .with_context(|| format!("replaying {}", file.display()))?;

    // A file may end mid-recording.
    if session.is_recording() {
        report.recordings.push(session.stop()?);
    }
    log_report(&report);
    publish(report.recordings, output, summary).await
}

pub async fn record(config: &TrailcapConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let session = CaptureSession::new(config)?;
    let (handle, task) = SessionActor::spawn(session);
    let reader = BufReader::new(tokio::io::stdin());
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let report = capture_until(&handle, reader, interrupt).await?;
    drop(handle);
    task.await?;

    log_report(&report);
    publish(report.recordings, output, false).await
}

/// Stream `reader` into the actor until it ends or `interrupt` resolves, then
/// close whatever recording is still open. Recordings closed earlier in the
/// stream are kept either way.
async fn capture_until<R, F>(
    handle: &SessionHandle,
    reader: R,
    interrupt: F,
) -> anyhow::Result<IngestReport>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let mut report = IngestReport::default();
    tokio::select! {
        result = ingest::stream_lines(reader, handle, &mut report) => result?,
        _ = interrupt => info!("Interrupted; closing the recording"),
    }

    if handle.status().await?.recording {
        report.recordings.push(handle.stop().await?);
    }
    Ok(report)
}

pub async fn summary(export: &Path) -> anyhow::Result<()> {
    let document = ExportDocument::read_from(export)
        .await
        .with_context(|| format!("reading {}", export.display()))?;
    println!(
        "Tab {} on {}",
        document.tab_id,
        document.domain.as_deref().unwrap_or("<unknown>")
    );
    println!("{}", format_timeline(&document.entries));
    Ok(())
}

fn log_report(report: &IngestReport) {
    info!(
        "{} notifications, {} rejected, {} malformed, {} recordings",
        report.notifications,
        report.rejected,
        report.malformed,
        report.recordings.len()
    );
}

async fn publish(
    recordings: Vec<FinishedRecording>,
    output: Option<&Path>,
    summary: bool,
) -> anyhow::Result<()> {
    if recordings.is_empty() {
        warn!("No recording found in input");
        return Ok(());
    }

    let exporter = match output {
        Some(path) if path.is_dir() => Some(JsonFileExporter::into_directory(path)),
        Some(path) if recordings.len() > 1 => {
            bail!(
                "{} recordings found; pass a directory instead of {}",
                recordings.len(),
                path.display()
            )
        }
        Some(path) => Some(JsonFileExporter::to_file(path)),
        None => None,
    };

    for recording in recordings {
        let document = ExportDocument::from(recording);
        if summary {
            println!("{}", format_timeline(&document.entries));
        }
        match &exporter {
            Some(exporter) => {
                let path = exporter.export(&document).await?;
                println!("Exported to {}", path.display());
            }
            None if !summary => println!("{}", document.to_json()?),
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const TWO_RECORDINGS: &str = r#"{"kind":"start","tab_id":7,"initial_url":"https://shop.example/","timestamp":1000}
{"kind":"navigation","tab_id":7,"url":"https://shop.example/cart","timestamp":1500}
{"kind":"stop"}
{"kind":"start","tab_id":8,"initial_url":"https://docs.example/","timestamp":3000}
"#;

    #[tokio::test]
    async fn test_interrupt_keeps_recordings_closed_earlier() {
        let session = CaptureSession::new(&TrailcapConfig::default()).unwrap();
        let (handle, task) = SessionActor::spawn(session);

        // The writer stays open, so the stream only ends through the interrupt.
        let (mut writer, reader) = tokio::io::duplex(4096);
        writer.write_all(TWO_RECORDINGS.as_bytes()).await.unwrap();

        let watcher = handle.clone();
        let interrupt = async move {
            while watcher.status().await.unwrap().tab_id != Some(8) {
                tokio::task::yield_now().await;
            }
        };

        let report = capture_until(&handle, BufReader::new(reader), interrupt)
            .await
            .unwrap();
        assert_eq!(report.notifications, 4);
        assert_eq!(report.recordings.len(), 2);
        assert_eq!(report.recordings[0].tab_id, 7);
        assert_eq!(report.recordings[0].entries.len(), 2);
        assert_eq!(report.recordings[1].tab_id, 8);
        assert!(!handle.status().await.unwrap().recording);

        drop(writer);
        drop(handle);
        task.await.unwrap();
    }
}

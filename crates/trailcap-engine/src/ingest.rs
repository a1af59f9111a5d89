//! JSON-lines notification streams.
//!
//! One `Notification` per line. Blank lines and lines starting with `#` are
//! skipped.

use crate::actor::{ActorError, SessionHandle};
use crate::protocol::Notification;
use crate::session::{CaptureSession, FinishedRecording};
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read notifications: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: invalid notification: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Actor(#[from] ActorError),
}

/// Counts gathered while feeding a stream.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub notifications: usize,
    /// Notifications the session refused. A stream only sees refusals of
    /// `start`/`stop`; data updates are judged inside the actor.
    pub rejected: usize,
    /// Lines that could not be decoded. Always 0 for a replay.
    pub malformed: usize,
    /// Recordings closed by a `stop` record, in stream order.
    pub recordings: Vec<FinishedRecording>,
}

pub fn parse_line(line: &str) -> Result<Option<Notification>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Feed `text` into `session` strictly in line order. Stops at the first line
/// that does not decode.
pub fn replay_str(session: &mut CaptureSession, text: &str) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    for (number, line) in text.lines().enumerate() {
        let notification = parse_line(line).map_err(|source| IngestError::Parse {
            line: number + 1,
            source,
        })?;
        let Some(notification) = notification else {
            continue;
        };

        report.notifications += 1;
        match session.apply(notification) {
            Ok(Some(recording)) => report.recordings.push(recording),
            Ok(None) => {}
            Err(e) => {
                debug!("Line {} rejected: {}", number + 1, e);
                report.rejected += 1;
            }
        }
    }
    Ok(report)
}

pub async fn replay_file(
    session: &mut CaptureSession,
    path: impl AsRef<Path>,
) -> Result<IngestReport, IngestError> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    replay_str(session, &text)
}

/// Forward a live stream into a running session actor. Undecodable lines are
/// logged and skipped. Returns at end of input.
///
/// Counts and closed recordings go into `report` as each line is handled, so
/// they survive if this future is dropped part way through the stream.
pub async fn stream_lines<R>(
    reader: R,
    handle: &SessionHandle,
    report: &mut IngestReport,
) -> Result<(), IngestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut number = 0;

    while let Some(line) = lines.next_line().await? {
        number += 1;
        let notification = match parse_line(&line) {
            Ok(Some(notification)) => notification,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping line {}: {}", number, e);
                report.malformed += 1;
                continue;
            }
        };

        report.notifications += 1;
        match handle.dispatch(notification).await {
            Ok(Some(recording)) => report.recordings.push(recording),
            Ok(None) => {}
            Err(ActorError::Capture(e)) => {
                debug!("Line {} rejected: {}", number, e);
                report.rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

//! Writing finished recordings out.

use crate::Timestamp;
use crate::entries::TimelineEntry;
use crate::protocol::TabId;
use crate::session::FinishedRecording;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unsupported export format version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub format_version: u32,
    pub tab_id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub initial_url: String,
    pub started_at: Timestamp,
    pub entries: Vec<TimelineEntry>,
}

impl ExportDocument {
    pub fn from_recording(recording: FinishedRecording) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            tab_id: recording.tab_id,
            domain: recording.domain,
            initial_url: recording.initial_url,
            started_at: recording.started_at,
            entries: recording.entries,
        }
    }

    /// `trailcap_<domain>_<started_at>.json`, with anything outside
    /// `[A-Za-z0-9.-]` in the domain replaced by `_`.
    pub fn default_file_name(&self) -> String {
        let domain: String = self
            .domain
            .as_deref()
            .unwrap_or("unknown")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("trailcap_{}_{}.json", domain, self.started_at)
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ExportError> {
        let document: ExportDocument = serde_json::from_str(text)?;
        if document.format_version != FORMAT_VERSION {
            return Err(ExportError::UnsupportedVersion(document.format_version));
        }
        Ok(document)
    }

    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }
}

impl From<FinishedRecording> for ExportDocument {
    fn from(recording: FinishedRecording) -> Self {
        Self::from_recording(recording)
    }
}

#[async_trait]
pub trait Exporter: Send + Sync {
    /// Persist `document`; returns where it went.
    async fn export(&self, document: &ExportDocument) -> Result<PathBuf, ExportError>;
}

/// Writes pretty-printed JSON, either to a fixed path or into a directory
/// using the document's default file name.
#[derive(Debug, Clone)]
pub enum JsonFileExporter {
    File(PathBuf),
    Directory(PathBuf),
}

impl JsonFileExporter {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn into_directory(dir: impl Into<PathBuf>) -> Self {
        Self::Directory(dir.into())
    }

    fn target(&self, document: &ExportDocument) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Directory(dir) => dir.join(document.default_file_name()),
        }
    }
}

#[async_trait]
impl Exporter for JsonFileExporter {
    async fn export(&self, document: &ExportDocument) -> Result<PathBuf, ExportError> {
        let path = self.target(document);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, document.to_json()?).await?;
        info!(
            "Exported {} entries to {}",
            document.entries.len(),
            path.display()
        );
        Ok(path)
    }
}

//! Content publishing pipeline
//!
//! Turns a [`Submission`] into exactly one outbound unit for the channel:
//! photos are downloaded, watermarked and sent as one media group, otherwise
//! the text is sent as a plain message. Every file created along the way is
//! removed once the cycle ends, whatever the outcome.

use crate::content::Submission;
use crate::utils::truncate_str;
use crate::watermark::{WatermarkError, Watermarker};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a publish cycle
#[derive(Error, Debug)]
pub enum PublishError {
    /// Original photo could not be fetched
    #[error("Download error: {0}")]
    Download(String),
    /// Channel rejected or never received the outbound unit
    #[error("Dispatch error: {0}")]
    Dispatch(String),
    /// Local file system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A watermarked photo queued for the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPhoto {
    /// Local file to upload
    pub path: PathBuf,
    /// Caption; only the first photo of a group carries one
    pub caption: Option<String>,
}

/// Interface to the destination channel and the asset source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Fetches the asset identified by `file_id` into `destination`.
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), PublishError>;
    /// Sends photos to the channel as one ordered group.
    async fn send_photos(&self, photos: Vec<OutboundPhoto>) -> Result<(), PublishError>;
    /// Sends a plain text message to the channel.
    async fn send_text(&self, text: String) -> Result<(), PublishError>;
}

/// What a successful cycle sent to the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A media group with this many photos
    Photos(usize),
    /// A plain text message
    Text,
    /// Nothing usable was left to send
    Nothing,
}

/// Files created during one publish cycle
#[derive(Debug, Default)]
pub struct TransientArtifacts {
    paths: Vec<PathBuf>,
}

impl TransientArtifacts {
    /// Registers a path for removal at the end of the cycle.
    ///
    /// Paths are registered before the file is created so partially written
    /// files are cleaned up too.
    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Number of tracked paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Best-effort removal of every tracked file.
    ///
    /// Files that were never created are skipped; other failures are logged
    /// and do not stop the remaining removals.
    pub async fn release(mut self) {
        for path in std::mem::take(&mut self.paths) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Transient file removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove transient file: {e}"),
            }
        }
    }
}

// A cycle cancelled before `release` (shutdown, dropped task) still cleans up.
impl Drop for TransientArtifacts {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Transient file removed on drop"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove transient file: {e}"),
            }
        }
    }
}

/// Removes artifacts left in `work_dir` by a previous run.
///
/// Only files named like publish artifacts (`orig_*`, `wm_*`) are touched.
/// Returns the number of files removed.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub async fn sweep_stale_artifacts(work_dir: &Path) -> Result<usize, PublishError> {
    let mut entries = tokio::fs::read_dir(work_dir).await?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with("orig_") || name.starts_with("wm_")) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %entry.path().display(), "Failed to remove stale artifact: {e}"),
        }
    }
    Ok(removed)
}

/// Publishes operator submissions to the channel
pub struct ContentPublisher<C> {
    channel: Arc<C>,
    watermarker: Watermarker,
    work_dir: PathBuf,
}

impl<C: ChannelTransport> ContentPublisher<C> {
    /// Creates a publisher writing transient files into `work_dir`.
    #[must_use]
    pub fn new(channel: Arc<C>, watermarker: Watermarker, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            channel,
            watermarker,
            work_dir: work_dir.into(),
        }
    }

    /// Publishes one submission.
    ///
    /// Photos whose watermark fails are dropped; the rest keep their order and
    /// the caption goes on the first surviving photo. With no photo left the
    /// fallback text is sent instead, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if a download, a local file operation or the channel
    /// dispatch fails. Transient files are removed in every case.
    pub async fn publish(&self, submission: &Submission) -> Result<PublishOutcome, PublishError> {
        let mut artifacts = TransientArtifacts::default();
        let result = self.assemble_and_send(submission, &mut artifacts).await;
        artifacts.release().await;
        result
    }

    async fn assemble_and_send(
        &self,
        submission: &Submission,
        artifacts: &mut TransientArtifacts,
    ) -> Result<PublishOutcome, PublishError> {
        let caption = submission.photo_caption().map(ToString::to_string);
        let mut photos: Vec<OutboundPhoto> = Vec::new();

        for file_id in submission.photo_file_ids() {
            let original = self.work_dir.join(format!("orig_{file_id}.jpg"));
            let output = self.work_dir.join(format!("wm_{file_id}.jpg"));
            artifacts.track(original.clone());
            artifacts.track(output.clone());

            self.channel.download(file_id, &original).await?;

            match self.watermark(original, output.clone()).await {
                Ok(()) => photos.push(OutboundPhoto {
                    path: output,
                    caption: if photos.is_empty() {
                        caption.clone()
                    } else {
                        None
                    },
                }),
                Err(e) => warn!(file_id = %file_id, "Dropping photo, watermark failed: {e}"),
            }
        }

        if !photos.is_empty() {
            let count = photos.len();
            self.channel.send_photos(photos).await?;
            info!(photos = count, "Media group published");
            return Ok(PublishOutcome::Photos(count));
        }

        if let Some(text) = submission.fallback_text() {
            self.channel.send_text(text.to_string()).await?;
            info!(preview = %truncate_str(text, 48), "Text post published");
            return Ok(PublishOutcome::Text);
        }

        info!("Submission had nothing publishable");
        Ok(PublishOutcome::Nothing)
    }

    async fn watermark(&self, source: PathBuf, output: PathBuf) -> Result<(), WatermarkError> {
        let watermarker = self.watermarker.clone();
        tokio::task::spawn_blocking(move || watermarker.apply(&source, &output))
            .await
            .map_err(|e| WatermarkError::Task(e.to_string()))?
    }
}

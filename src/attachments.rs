//! Attachment encoding and upload queue.
//!
//! Files are encoded as base64 data URLs and uploaded one at a time. While
//! an upload is in flight the owning form refuses to submit. A failed
//! upload records an error for that file and the queue moves on.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;

use crate::error::{DeskError, Result};
use crate::gateway::{Gateway, UploadPayload};

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn mime_type(&self) -> &'static str {
        mime_for(&self.name)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// The upload currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub file: String,
    pub percent: u8,
}

#[derive(Debug, Default)]
struct Inner {
    urls: Vec<String>,
    errors: BTreeMap<String, String>,
    in_flight: Option<InFlight>,
}

/// Outcome of one upload batch.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl UploadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Attachment URLs owned by a form, plus upload state.
///
/// Clones share state, so a view can watch progress while a task uploads.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    inner: Arc<Mutex<Inner>>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from URLs already on a ticket.
    pub fn with_urls(urls: impl IntoIterator<Item = String>) -> Self {
        let set = Self::new();
        set.inner.lock().urls.extend(urls);
        set
    }

    pub fn urls(&self) -> Vec<String> {
        self.inner.lock().urls.clone()
    }

    pub fn push_url(&self, url: impl Into<String>) {
        self.inner.lock().urls.push(url.into());
    }

    pub fn remove_url(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.urls.len();
        inner.urls.retain(|u| u != url);
        inner.urls.len() != before
    }

    /// Per-file upload errors, keyed by file name.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.inner
            .lock()
            .errors
            .iter()
            .map(|(f, m)| (f.clone(), m.clone()))
            .collect()
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.inner.lock().in_flight.clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// Refuse submission while an upload is running.
    pub fn ensure_idle(&self) -> Result<()> {
        if self.is_uploading() {
            return Err(DeskError::UploadInProgress);
        }
        Ok(())
    }

    pub(crate) fn set_progress(&self, file: &str, percent: u8) {
        let mut inner = self.inner.lock();
        inner.in_flight = Some(InFlight {
            file: file.to_string(),
            percent,
        });
    }

    /// Upload `files` sequentially, appending each hosted URL.
    ///
    /// `on_progress` is called with the file name and percentage. A 401
    /// stops the batch, since the session is gone; any other failure is
    /// recorded for that file and the next file is attempted.
    pub async fn upload_all(
        &self,
        gateway: &dyn Gateway,
        files: Vec<PendingFile>,
        on_progress: &(dyn Fn(&str, u8) + Send + Sync),
    ) -> Result<UploadReport> {
        self.ensure_idle()?;
        let mut report = UploadReport::default();

        for file in files {
            self.set_progress(&file.name, 0);
            self.inner.lock().errors.remove(&file.name);

            let payload = UploadPayload {
                image: file.to_data_url(),
            };
            let name = file.name.clone();
            let progress = |pct: u8| {
                self.set_progress(&name, pct);
                on_progress(&name, pct);
            };

            let result = gateway.upload_image(&payload, &progress).await;
            self.inner.lock().in_flight = None;

            match result {
                Ok(url) => {
                    tracing::debug!("uploaded '{}' to {url}", file.name);
                    self.push_url(url.clone());
                    report.uploaded.push(url);
                }
                Err(DeskError::Unauthorized) => return Err(DeskError::Unauthorized),
                Err(e) => {
                    let message = e.store_message();
                    tracing::warn!("upload of '{}' failed: {message}", file.name);
                    self.inner
                        .lock()
                        .errors
                        .insert(file.name.clone(), message.clone());
                    report.failed.push((file.name, message));
                }
            }
        }

        Ok(report)
    }
}

//! Host collaborators: notifications, prompts, image upload and time.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

/// Shows short messages to the user.
pub trait Notifier {
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Error => tracing::warn!(%level, message),
            NotifyLevel::Info | NotifyLevel::Success => tracing::info!(%level, message),
        }
    }
}

/// Notifier that keeps every message, for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(NotifyLevel, String)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(NotifyLevel, String)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, message.to_string()));
        }
    }
}

/// Asks the user for a line of text. `None` means cancelled.
pub trait Prompt {
    fn prompt(&self, message: &str, default: &str) -> Option<String>;
}

/// Prompt that always cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn prompt(&self, _message: &str, _default: &str) -> Option<String> {
        None
    }
}

/// Prompt that replies with a fixed answer.
#[derive(Debug, Clone)]
pub struct FixedPrompt(pub Option<String>);

impl Prompt for FixedPrompt {
    fn prompt(&self, _message: &str, _default: &str) -> Option<String> {
        self.0.clone()
    }
}

/// An image handed over by paste or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Whether the MIME type or file name marks this as an image.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
            || crate::document::is_image_file(std::path::Path::new(&self.name))
    }

    /// File name without its extension, used as alt text.
    pub fn stem(&self) -> &str {
        std::path::Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
    }
}

/// Failure reported by an [`ImageUploader`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{0} is not an image")]
    NotAnImage(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("upload transport failed: {0}")]
    Transport(String),
}

/// Stores an image and returns the URL to embed.
pub trait ImageUploader {
    /// # Errors
    ///
    /// Returns an [`UploadError`] when the image cannot be stored.
    fn upload(&self, image: &ImageFile) -> Result<String, UploadError>;
}

/// Uploader that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUploader;

impl ImageUploader for NoUploader {
    fn upload(&self, image: &ImageFile) -> Result<String, UploadError> {
        Err(UploadError::Rejected(format!(
            "no uploader configured for {}",
            image.name
        )))
    }
}

/// Milliseconds since some fixed origin.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<u64>>,
}

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        if let Ok(mut now) = self.now.lock() {
            *now = now.saturating_add(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.lock().map(|n| *n).unwrap_or_default()
    }
}

//! Timing scopes and engine events.
//!
//! Both report through `tracing`. Timing goes to the `markline::perf`
//! target and is skipped entirely unless [`set_enabled`] turned it on.
//! Engine events go to [`EVENT_TARGET`]; the binary routes that target to
//! the event log file when one is configured.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Target of every [`EngineEvent`].
pub const EVENT_TARGET: &str = "markline::events";

static ENABLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(target: "markline::perf", scope = self.name, elapsed_ms, "timing");
    }
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Something the engine did that is worth a line in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent<'a> {
    /// A snapshot was added to history
    HistoryPush { index: usize, len: usize },
    /// Undo or redo replaced the document with a snapshot
    HistoryRestore { index: usize },
    UploadQueued { id: u64, name: &'a str },
    UploadFinished { id: u64, ok: bool },
}

impl EngineEvent<'_> {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HistoryPush { .. } => "history.push",
            Self::HistoryRestore { .. } => "history.restore",
            Self::UploadQueued { .. } => "upload.queue",
            Self::UploadFinished { .. } => "upload.finish",
        }
    }

    /// Emit the event on [`EVENT_TARGET`].
    pub fn record(&self) {
        tracing::debug!(target: EVENT_TARGET, event = self.name(), "{self}");
    }
}

impl fmt::Display for EngineEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            Self::HistoryPush { index, len } => write!(f, " index={index} len={len}"),
            Self::HistoryRestore { index } => write!(f, " index={index}"),
            Self::UploadQueued { id, name } => write!(f, " id={id} name={name}"),
            Self::UploadFinished { id, ok } => write!(f, " id={id} ok={ok}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    #[test]
    fn test_set_enabled_toggles_runtime_flag() {
        set_enabled(true);
        assert!(is_enabled());
        drop(scope("test.scope"));

        set_enabled(false);
        assert!(!is_enabled());
    }

    #[test]
    fn test_event_display_carries_fields() {
        let queued = EngineEvent::UploadQueued {
            id: 3,
            name: "cat.png",
        };
        assert_eq!(queued.to_string(), "upload.queue id=3 name=cat.png");
        assert_eq!(
            EngineEvent::UploadFinished { id: 3, ok: false }.to_string(),
            "upload.finish id=3 ok=false"
        );
    }

    #[test]
    fn test_recorded_event_reaches_subscriber() {
        let file = NamedTempFile::new().unwrap();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(file.reopen().unwrap()))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            EngineEvent::HistoryPush { index: 1, len: 2 }.record();
        });

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("history.push index=1 len=2"), "{content}");
        assert!(content.contains(EVENT_TARGET));
    }
}

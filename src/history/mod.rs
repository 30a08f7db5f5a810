//! Snapshot-based undo/redo.
//!
//! Every entry is the full markdown of the document at some point; there
//! are no diffs. `index` always names the entry that matches the current
//! document, so undo and redo are plain index moves followed by a restore.

mod debounce;

pub use debounce::Debouncer;

use serde::{Deserialize, Serialize};

/// Default number of retained snapshots.
pub const DEFAULT_LIMIT: usize = 50;

/// Default idle time before an edit is snapshotted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// A full-document snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    markdown: String,
}

impl Snapshot {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }
}

/// Bounded snapshot stack with a debounced save.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<Snapshot>,
    index: usize,
    limit: usize,
    debouncer: Debouncer,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_DEBOUNCE_MS)
    }
}

impl HistoryManager {
    /// A limit of 0 is treated as 1; there is always a current entry once
    /// anything has been saved.
    pub fn new(limit: usize, debounce_ms: u64) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            limit: limit.max(1),
            debouncer: Debouncer::new(debounce_ms),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub const fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.index)
    }

    /// Record that the document changed; the snapshot is taken once the
    /// debounce delay passes without another edit.
    pub const fn note_edit(&mut self, now_ms: u64) {
        self.debouncer.queue(now_ms);
    }

    /// Take the debounced snapshot if it is due. Returns whether an entry
    /// was added.
    pub fn poll(&mut self, now_ms: u64, markdown: &str) -> bool {
        if self.debouncer.take_ready(now_ms) {
            self.push(markdown)
        } else {
            false
        }
    }

    /// Snapshot immediately, dropping any pending debounced save.
    pub fn safe_save(&mut self, markdown: &str) -> bool {
        self.debouncer.cancel();
        self.push(markdown)
    }

    fn push(&mut self, markdown: &str) -> bool {
        if self.current().is_some_and(|s| s.markdown == markdown) {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(Snapshot::new(markdown));
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
        crate::perf::EngineEvent::HistoryPush {
            index: self.index,
            len: self.entries.len(),
        }
        .record();
        true
    }

    /// Step back one entry. `markdown` is the live document, saved first so
    /// an edit still waiting on the debounce is not lost.
    pub fn undo(&mut self, markdown: &str) -> Option<&Snapshot> {
        if self.debouncer.is_pending() {
            self.safe_save(markdown);
        }
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        tracing::debug!(index = self.index, "history undo");
        self.entries.get(self.index)
    }

    /// Step forward one entry. A pending edit is saved first, which drops
    /// the redo tail.
    pub fn redo(&mut self, markdown: &str) -> Option<&Snapshot> {
        if self.debouncer.is_pending() {
            self.safe_save(markdown);
        }
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        tracing::debug!(index = self.index, "history redo");
        self.entries.get(self.index)
    }

    /// Drop every entry and any pending save.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.debouncer.cancel();
    }
}

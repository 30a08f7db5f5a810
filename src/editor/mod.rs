//! The in-place markdown editor.
//!
//! [`Editor`] owns one [`Document`], renders it line by line into an
//! [`EditableSurface`], and keeps raw text, rendering, caret and history in
//! step after every command. Hosts drive it either by calling command
//! methods directly or by forwarding [`Message`]s to [`Editor::dispatch`].

mod commands;
mod message;
mod paste;
mod text;

pub use commands::{FormatKind, ListStyle};
pub use message::{Key, KeyPress, Message};
pub use paste::{Clipboard, UploadTicket};

use std::fmt;

use crate::collab::{Clock, LogNotifier, NoPrompt, Notifier, Prompt, SystemClock};
use crate::document::{Document, HeadingRef};
use crate::history::{DEFAULT_DEBOUNCE_MS, DEFAULT_LIMIT, HistoryManager};
use crate::render::{Element, RenderMode, render_line};
use crate::selection::{self, CursorState};
use crate::surface::EditableSurface;

/// Callback receiving a string (the markdown, or the document title).
pub type TextCallback = Box<dyn FnMut(&str)>;

/// Construction options for [`Editor`].
pub struct EditorOptions {
    read_only: bool,
    initial_value: String,
    on_change: Option<TextCallback>,
    on_title_sync: Option<TextCallback>,
    notifier: Box<dyn Notifier>,
    prompt: Box<dyn Prompt>,
    clock: Box<dyn Clock>,
    history_limit: usize,
    debounce_ms: u64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            initial_value: String::new(),
            on_change: None,
            on_title_sync: None,
            notifier: Box::new(LogNotifier),
            prompt: Box::new(NoPrompt),
            clock: Box::new(SystemClock::default()),
            history_limit: DEFAULT_LIMIT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl fmt::Debug for EditorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorOptions")
            .field("read_only", &self.read_only)
            .field("initial_value", &self.initial_value)
            .field("on_change", &self.on_change.is_some())
            .field("on_title_sync", &self.on_title_sync.is_some())
            .field("history_limit", &self.history_limit)
            .field("debounce_ms", &self.debounce_ms)
            .finish_non_exhaustive()
    }
}

impl EditorOptions {
    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_initial_value(mut self, markdown: impl Into<String>) -> Self {
        self.initial_value = markdown.into();
        self
    }

    /// Called with the full markdown after every mutation.
    #[must_use]
    pub fn on_change(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Called with the first H1's plain text whenever it changes.
    #[must_use]
    pub fn on_title_sync(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_title_sync = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub const fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub const fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }
}

/// One editor instance bound to one surface.
pub struct Editor<S: EditableSurface> {
    surface: S,
    doc: Document,
    history: HistoryManager,
    mode: RenderMode,
    cursor: CursorState,
    composing: bool,
    torn_down: bool,
    last_title: Option<String>,
    uploads: Vec<UploadTicket>,
    next_ticket: u64,
    on_change: Option<TextCallback>,
    on_title_sync: Option<TextCallback>,
    notifier: Box<dyn Notifier>,
    prompt: Box<dyn Prompt>,
    clock: Box<dyn Clock>,
}

impl<S: EditableSurface + fmt::Debug> fmt::Debug for Editor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("surface", &self.surface)
            .field("doc", &self.doc)
            .field("mode", &self.mode)
            .field("cursor", &self.cursor)
            .field("history_index", &self.history.index())
            .finish_non_exhaustive()
    }
}

impl<S: EditableSurface> Editor<S> {
    /// Bind an editor to `surface` and render the initial value into it.
    pub fn new(surface: S, options: EditorOptions) -> Self {
        let EditorOptions {
            read_only,
            initial_value,
            on_change,
            on_title_sync,
            notifier,
            prompt,
            clock,
            history_limit,
            debounce_ms,
        } = options;
        let mode = if read_only {
            RenderMode::ReadOnly
        } else {
            RenderMode::Editable
        };
        let mut editor = Self {
            surface,
            doc: Document::from_markdown(&initial_value),
            history: HistoryManager::new(history_limit, debounce_ms),
            mode,
            cursor: CursorState::default(),
            composing: false,
            torn_down: false,
            last_title: None,
            uploads: Vec::new(),
            next_ticket: 1,
            on_change,
            on_title_sync,
            notifier,
            prompt,
            clock,
        };
        editor.surface.set_editable(!read_only);
        editor.render_all();
        editor.history.safe_save(&editor.doc.markdown());
        editor.sync_title();
        tracing::debug!(lines = editor.doc.line_count(), read_only, "editor created");
        editor
    }

    /// Replace the whole document. History is kept; the new content becomes
    /// its current entry.
    pub fn set_content(&mut self, markdown: &str) {
        if self.torn_down {
            return;
        }
        self.doc.set_content(markdown);
        self.render_all();
        self.place_cursor(CursorState::default());
        self.history.safe_save(markdown);
        self.sync_title();
    }

    /// The document serialized as markdown.
    pub fn markdown(&self) -> String {
        self.doc.markdown()
    }

    pub const fn document(&self) -> &Document {
        &self.doc
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for hosts that edit the surface directly. Follow any
    /// text change with [`Editor::input`].
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub const fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn is_read_only(&self) -> bool {
        self.mode == RenderMode::ReadOnly
    }

    /// Switch between editing and read-only viewing.
    pub fn set_read_only(&mut self, read_only: bool) {
        let mode = if read_only {
            RenderMode::ReadOnly
        } else {
            RenderMode::Editable
        };
        if mode == self.mode || self.torn_down {
            return;
        }
        self.mode = mode;
        self.surface.set_editable(!read_only);
        self.render_all();
        if !read_only {
            self.place_cursor(self.cursor);
        }
    }

    /// Headings in document order.
    pub fn outline(&self) -> Vec<HeadingRef> {
        self.doc.headings()
    }

    pub fn focus(&mut self) {
        if self.torn_down {
            return;
        }
        self.surface.focus();
        if !self.is_read_only() {
            self.place_cursor(self.cursor);
        }
    }

    /// The caret as the surface currently reports it.
    pub fn cursor(&self) -> CursorState {
        let cursor = selection::read_cursor(&self.surface).unwrap_or(self.cursor);
        self.clamp(cursor)
    }

    /// Move the caret (and same-line selection) without editing.
    pub fn set_cursor(&mut self, cursor: CursorState) {
        if self.torn_down {
            return;
        }
        self.place_cursor(cursor);
    }

    /// Raw caret offset within `line`, 0 when the caret is elsewhere.
    pub fn caret_offset(&self, line: usize) -> usize {
        selection::caret_offset(&self.surface, line)
    }

    pub fn set_caret_offset(&mut self, line: usize, offset: usize) {
        self.set_cursor(CursorState::caret(line, offset));
    }

    pub fn undo(&mut self) {
        if !self.is_editable() {
            return;
        }
        let current = self.doc.markdown();
        if let Some(snapshot) = self.history.undo(&current).cloned() {
            self.restore(snapshot.markdown());
        }
    }

    pub fn redo(&mut self) {
        if !self.is_editable() {
            return;
        }
        let current = self.doc.markdown();
        if let Some(snapshot) = self.history.redo(&current).cloned() {
            self.restore(snapshot.markdown());
        }
    }

    /// Snapshot the document now instead of waiting for the debounce.
    pub fn safe_save_history(&mut self) {
        if self.torn_down {
            return;
        }
        self.history.safe_save(&self.doc.markdown());
    }

    /// Let time-based work run: takes the debounced history snapshot once
    /// the editor has been idle long enough.
    pub fn tick(&mut self) {
        if !self.history.is_pending() {
            return;
        }
        let now = self.clock.now_ms();
        let markdown = self.doc.markdown();
        self.history.poll(now, &markdown);
    }

    /// Release the surface, the pending snapshot timer and queued uploads.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.history.clear();
        self.uploads.clear();
        self.surface.teardown();
        self.torn_down = true;
        tracing::debug!("editor torn down");
    }

    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn is_editable(&self) -> bool {
        !self.torn_down && self.mode == RenderMode::Editable
    }

    fn restore(&mut self, markdown: &str) {
        let _scope = crate::perf::scope("editor.restore");
        self.doc.set_content(markdown);
        self.render_all();
        let last = self.doc.last_index();
        let end = self.doc.line(last).map_or(0, crate::document::Line::char_len);
        self.place_cursor(CursorState::caret(last, end));
        crate::perf::EngineEvent::HistoryRestore {
            index: self.history.index(),
        }
        .record();
        self.emit_change();
    }

    fn clamp(&self, cursor: CursorState) -> CursorState {
        let line = cursor.line.min(self.doc.last_index());
        let len = self.doc.line(line).map_or(0, crate::document::Line::char_len);
        let clamped = CursorState::caret(line, cursor.offset.min(len));
        match cursor.anchor {
            Some(anchor) if cursor.line == line => clamped.with_anchor(anchor.min(len)),
            _ => clamped,
        }
    }

    fn render(&self, index: usize) -> Option<Element> {
        self.doc.line(index).map(|line| render_line(line, self.mode))
    }

    fn render_all(&mut self) {
        let _scope = crate::perf::scope("editor.render_all");
        self.surface.render_document(&self.doc, self.mode);
    }

    /// Re-render lines after the document changed underneath them.
    fn refresh_lines(&mut self, indices: &[usize]) {
        for &index in indices {
            let Some(markup) = self.render(index) else {
                continue;
            };
            if let Err(err) = self.surface.replace_line(index, markup) {
                tracing::warn!(%err, index, "line refresh failed, re-rendering all");
                self.render_all();
                return;
            }
        }
    }

    fn set_line(&mut self, index: usize, raw: impl Into<String>) {
        let changed = self.doc.set_raw(index, raw);
        self.refresh_lines(&changed);
    }

    fn insert_line(&mut self, index: usize, raw: impl Into<String>) {
        let index = index.min(self.doc.line_count());
        let changed = self.doc.insert_line(index, raw);
        let Some(markup) = self.render(index) else {
            return;
        };
        if let Err(err) = self.surface.insert_line(index, markup) {
            tracing::warn!(%err, index, "line insert failed, re-rendering all");
            self.render_all();
            return;
        }
        self.refresh_lines(&changed);
    }

    fn remove_line(&mut self, index: usize) {
        if self.doc.line_count() == 1 {
            self.set_line(0, "");
            return;
        }
        let changed = self.doc.remove_line(index);
        if let Err(err) = self.surface.remove_line(index) {
            tracing::warn!(%err, index, "line removal failed, re-rendering all");
            self.render_all();
            return;
        }
        self.refresh_lines(&changed);
    }

    fn place_cursor(&mut self, cursor: CursorState) {
        let cursor = self.clamp(cursor);
        self.cursor = cursor;
        if self.mode == RenderMode::Editable {
            tracing::trace!(line = cursor.line, offset = cursor.offset, "restore caret");
            selection::set_cursor(&mut self.surface, cursor);
        }
    }

    /// Common tail of every mutating command.
    fn finish(&mut self, cursor: CursorState) {
        self.place_cursor(cursor);
        self.history.note_edit(self.clock.now_ms());
        self.emit_change();
    }

    fn emit_change(&mut self) {
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.doc.markdown());
        }
        self.sync_title();
    }

    fn sync_title(&mut self) {
        let title = self.doc.title();
        if title == self.last_title {
            return;
        }
        tracing::debug!(?title, "title changed");
        if let Some(callback) = self.on_title_sync.as_mut() {
            callback(title.as_deref().unwrap_or_default());
        }
        self.last_title = title;
    }
}

//! The editable surface the editor renders into.
//!
//! A host (a browser DOM, a native text view, a test double) implements
//! [`EditableSurface`]; the editor only ever talks to it through rendered
//! [`Element`] trees and [`NativeSelection`]s. Input, paste and drop events
//! flow the other way, as [`crate::editor::Message`]s the host dispatches.

use crate::document::Document;
use crate::render::{Element, Node, RenderMode, render_line};
use crate::selection::{self, NativePoint, NativeSelection};

/// Error from a surface operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("line {index} out of range for {len} lines")]
    LineOutOfRange { index: usize, len: usize },
    #[error("surface is detached")]
    Detached,
    #[error("{0}")]
    Platform(String),
}

impl From<&str> for SurfaceError {
    fn from(s: &str) -> Self {
        Self::Platform(s.to_string())
    }
}

/// Host-side line container with a native selection.
pub trait EditableSurface {
    /// Replace every rendered line.
    fn set_lines(&mut self, lines: Vec<Element>);

    fn replace_line(&mut self, index: usize, markup: Element) -> Result<(), SurfaceError>;

    /// Insert before `index`; `index == line_count()` appends.
    fn insert_line(&mut self, index: usize, markup: Element) -> Result<(), SurfaceError>;

    fn remove_line(&mut self, index: usize) -> Result<(), SurfaceError>;

    fn line_count(&self) -> usize;

    /// Current markup of a line, including any edits the host made to it.
    fn line_markup(&self, index: usize) -> Option<Element>;

    /// Current text of a line.
    fn line_text(&self, index: usize) -> Option<String> {
        self.line_markup(index).map(|el| el.text_content())
    }

    fn selection(&self) -> Result<Option<NativeSelection>, SurfaceError>;

    fn set_selection(&mut self, selection: NativeSelection) -> Result<(), SurfaceError>;

    fn focus(&mut self);

    /// Toggle whether the host accepts direct text input.
    fn set_editable(&mut self, editable: bool);

    /// Detach from the host. Further calls may fail with
    /// [`SurfaceError::Detached`].
    fn teardown(&mut self) {
        self.set_lines(Vec::new());
    }

    /// Render a whole document into the surface.
    fn render_document(&mut self, doc: &Document, mode: RenderMode) {
        self.set_lines(doc.lines().iter().map(|l| render_line(l, mode)).collect());
    }
}

/// In-memory surface, used headless and in tests.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    lines: Vec<Element>,
    selection: Option<NativeSelection>,
    focused: bool,
    editable: bool,
    detached: bool,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            selection: None,
            focused: false,
            editable: true,
            detached: false,
        }
    }

    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    pub const fn is_editable(&self) -> bool {
        self.editable
    }

    pub const fn is_detached(&self) -> bool {
        self.detached
    }

    /// Serialized HTML of every line, one per row.
    pub fn html(&self) -> String {
        self.lines
            .iter()
            .map(Element::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of every line joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(Element::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Type text at the caret the way a host would, replacing any same-line
    /// selection. Returns the edited line.
    ///
    /// The line's markup is left undecorated until the editor re-renders it.
    pub fn type_text(&mut self, text: &str) -> Option<usize> {
        let cursor = selection::read_cursor(self)?;
        let current = self.line_text(cursor.line)?;
        let (start, end) = cursor.range();
        let mut chars: Vec<char> = current.chars().collect();
        let end = end.min(chars.len());
        let start = start.min(end);
        chars.splice(start..end, text.chars());
        self.overwrite_line(cursor.line, chars.into_iter().collect());
        selection::set_caret_offset(self, cursor.line, start + text.chars().count());
        Some(cursor.line)
    }

    /// Overwrite a line with plain text, as a host edit would.
    pub fn overwrite_line(&mut self, index: usize, text: String) {
        if let Some(line) = self.lines.get_mut(index) {
            *line = Element::new("div").class("md-line").child(Node::text(text));
        }
    }

    fn check_line(&self, index: usize, len: usize) -> Result<(), SurfaceError> {
        if self.detached {
            return Err(SurfaceError::Detached);
        }
        if index >= len {
            return Err(SurfaceError::LineOutOfRange { index, len });
        }
        Ok(())
    }
}

impl EditableSurface for MemorySurface {
    fn set_lines(&mut self, lines: Vec<Element>) {
        self.lines = lines;
        self.selection = None;
    }

    fn replace_line(&mut self, index: usize, markup: Element) -> Result<(), SurfaceError> {
        self.check_line(index, self.lines.len())?;
        self.lines[index] = markup;
        Ok(())
    }

    fn insert_line(&mut self, index: usize, markup: Element) -> Result<(), SurfaceError> {
        self.check_line(index, self.lines.len() + 1)?;
        self.lines.insert(index, markup);
        Ok(())
    }

    fn remove_line(&mut self, index: usize) -> Result<(), SurfaceError> {
        self.check_line(index, self.lines.len())?;
        self.lines.remove(index);
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_markup(&self, index: usize) -> Option<Element> {
        self.lines.get(index).cloned()
    }

    fn selection(&self) -> Result<Option<NativeSelection>, SurfaceError> {
        if self.detached {
            return Err(SurfaceError::Detached);
        }
        Ok(self.selection.clone())
    }

    fn set_selection(&mut self, selection: NativeSelection) -> Result<(), SurfaceError> {
        for point in [&selection.anchor, &selection.focus] {
            let line = NativePoint::line(point).ok_or(SurfaceError::from("empty selection path"))?;
            self.check_line(line, self.lines.len())?;
        }
        self.selection = Some(selection);
        Ok(())
    }

    fn focus(&mut self) {
        self.focused = !self.detached;
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    fn teardown(&mut self) {
        self.lines.clear();
        self.selection = None;
        self.focused = false;
        self.detached = true;
    }
}

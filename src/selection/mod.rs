//! Selection mapping between the rendered surface and raw offsets.
//!
//! A [`NativePoint`] addresses the rendered tree: `path[0]` is the line,
//! later entries are child indices inside that line's element. Raw offsets
//! are counted in characters of the line's markdown.

mod mapper;

pub use mapper::{point_for_offset, raw_offset};

use crate::surface::EditableSurface;

/// Failure to translate a rendered position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("point has an empty path")]
    EmptyPath,
    #[error("no rendered line {0}")]
    MissingLine(usize),
    #[error("path {0:?} does not resolve to a node")]
    Detached(Vec<usize>),
    #[error("offset {offset} is outside a node of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// A position in the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativePoint {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl NativePoint {
    pub const fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Line index this point lives in.
    pub fn line(&self) -> Option<usize> {
        self.path.first().copied()
    }
}

/// A native selection, possibly collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeSelection {
    pub anchor: NativePoint,
    pub focus: NativePoint,
}

impl NativeSelection {
    /// A collapsed selection at `point`.
    pub fn caret(point: NativePoint) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Caret or same-line selection in raw coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub line: usize,
    /// Caret position (the selection focus)
    pub offset: usize,
    /// Other end of the selection when it spans text on the same line
    pub anchor: Option<usize>,
}

impl CursorState {
    pub const fn caret(line: usize, offset: usize) -> Self {
        Self {
            line,
            offset,
            anchor: None,
        }
    }

    #[must_use]
    pub const fn with_anchor(mut self, anchor: usize) -> Self {
        if anchor != self.offset {
            self.anchor = Some(anchor);
        }
        self
    }

    /// Ordered `(start, end)` of the selection.
    pub fn range(&self) -> (usize, usize) {
        let anchor = self.anchor.unwrap_or(self.offset);
        (anchor.min(self.offset), anchor.max(self.offset))
    }

    pub const fn has_selection(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Raw offset of a native point, resolved against the surface's markup.
fn point_offset<S: EditableSurface + ?Sized>(
    surface: &S,
    point: &NativePoint,
) -> Result<(usize, usize), MappingError> {
    let (&line, rest) = point.path.split_first().ok_or(MappingError::EmptyPath)?;
    let markup = surface
        .line_markup(line)
        .ok_or(MappingError::MissingLine(line))?;
    Ok((line, raw_offset(&markup, rest, point.offset)?))
}

/// Caret offset inside `line`.
///
/// Anything unexpected (no selection, a selection in another line, a
/// detached node) yields 0.
pub fn caret_offset<S: EditableSurface + ?Sized>(surface: &S, line: usize) -> usize {
    let selection = match surface.selection() {
        Ok(Some(selection)) => selection,
        Ok(None) => return 0,
        Err(err) => {
            tracing::warn!(%err, "selection query failed");
            return 0;
        }
    };
    match point_offset(surface, &selection.focus) {
        Ok((found, offset)) if found == line => offset,
        Ok((found, _)) => {
            tracing::debug!(found, line, "caret is in a different line");
            0
        }
        Err(err) => {
            tracing::warn!(%err, line, "caret mapping failed");
            0
        }
    }
}

/// Place a collapsed caret at `offset` in `line`, clamped to line end.
pub fn set_caret_offset<S: EditableSurface + ?Sized>(surface: &mut S, line: usize, offset: usize) {
    set_cursor(surface, CursorState::caret(line, offset));
}

/// Apply a raw cursor to the surface.
pub fn set_cursor<S: EditableSurface + ?Sized>(surface: &mut S, cursor: CursorState) {
    let Some(markup) = surface.line_markup(cursor.line) else {
        tracing::warn!(line = cursor.line, "cannot place caret in missing line");
        return;
    };
    let to_point = |offset: usize| {
        let (mut path, inner) = point_for_offset(&markup, offset);
        path.insert(0, cursor.line);
        NativePoint::new(path, inner)
    };
    let focus = to_point(cursor.offset);
    let anchor = cursor.anchor.map_or_else(|| focus.clone(), to_point);
    if let Err(err) = surface.set_selection(NativeSelection { anchor, focus }) {
        tracing::warn!(%err, "failed to set selection");
    }
}

/// Read the surface selection back as a raw cursor.
///
/// A selection whose ends sit in different lines collapses to its focus.
pub fn read_cursor<S: EditableSurface + ?Sized>(surface: &S) -> Option<CursorState> {
    let selection = match surface.selection() {
        Ok(selection) => selection?,
        Err(err) => {
            tracing::warn!(%err, "selection query failed");
            return None;
        }
    };
    let (line, offset) = match point_offset(surface, &selection.focus) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(%err, "focus mapping failed");
            (selection.focus.line()?, 0)
        }
    };
    let cursor = CursorState::caret(line, offset);
    match point_offset(surface, &selection.anchor) {
        Ok((anchor_line, anchor)) if anchor_line == line => Some(cursor.with_anchor(anchor)),
        _ => Some(cursor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::render::RenderMode;
    use crate::surface::MemorySurface;

    fn surface_for(md: &str) -> MemorySurface {
        let doc = Document::from_markdown(md);
        let mut surface = MemorySurface::new();
        surface.render_document(&doc, RenderMode::Editable);
        surface
    }

    #[test]
    fn test_caret_roundtrip_through_surface() {
        let mut surface = surface_for("plain\n## **Bold** heading");
        for offset in 0..=18 {
            set_caret_offset(&mut surface, 1, offset);
            assert_eq!(caret_offset(&surface, 1), offset);
        }
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let mut surface = surface_for("abc");
        set_caret_offset(&mut surface, 0, 40);
        assert_eq!(caret_offset(&surface, 0), 3);
    }

    #[test]
    fn test_caret_in_other_line_reads_as_zero() {
        let mut surface = surface_for("one\ntwo");
        set_caret_offset(&mut surface, 1, 2);
        assert_eq!(caret_offset(&surface, 0), 0);
    }

    #[test]
    fn test_no_selection_reads_as_zero() {
        let surface = surface_for("text");
        assert_eq!(caret_offset(&surface, 0), 0);
        assert_eq!(read_cursor(&surface), None);
    }

    #[test]
    fn test_detached_selection_falls_back_to_zero() {
        let mut surface = surface_for("text");
        surface
            .set_selection(NativeSelection::caret(NativePoint::new(vec![0, 9], 1)))
            .unwrap();
        assert_eq!(caret_offset(&surface, 0), 0);
    }

    #[test]
    fn test_read_cursor_keeps_same_line_selection() {
        let mut surface = surface_for("hello world");
        set_cursor(&mut surface, CursorState::caret(0, 11).with_anchor(6));
        let cursor = read_cursor(&surface).unwrap();
        assert_eq!(cursor.range(), (6, 11));
        assert_eq!(cursor.offset, 11);
    }

    #[test]
    fn test_read_cursor_collapses_cross_line_selection() {
        let mut surface = surface_for("one\ntwo");
        let anchor = NativePoint::new(vec![0, 0], 1);
        let focus = NativePoint::new(vec![1, 0], 2);
        surface
            .set_selection(NativeSelection { anchor, focus })
            .unwrap();
        assert_eq!(read_cursor(&surface), Some(CursorState::caret(1, 2)));
    }

    #[test]
    fn test_cursor_range_is_ordered() {
        let cursor = CursorState::caret(0, 2).with_anchor(7);
        assert_eq!(cursor.range(), (2, 7));
        assert!(!CursorState::caret(0, 3).with_anchor(3).has_selection());
    }
}

//! Core document types.

use serde::{Deserialize, Serialize};

use super::block::{classify_block, parse_heading};

/// Block classification of one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Paragraph text, or anything unclassifiable
    Normal,
    /// Heading with level (1-6)
    Heading(u8),
    /// Block quote line
    Blockquote,
    /// Horizontal rule
    HorizontalRule,
    /// Bullet, ordered or task item
    ListItem { ordered: bool, task: Option<bool> },
    /// Pipe-delimited table row
    TableRow,
    /// Opening code fence with its language suffix
    FenceStart { lang: String },
    /// Line inside an open fence
    FenceContent,
    /// Closing code fence
    FenceEnd,
}

impl LineKind {
    /// Whether this line belongs to a fenced code block.
    pub const fn is_fence(&self) -> bool {
        matches!(
            self,
            Self::FenceStart { .. } | Self::FenceContent | Self::FenceEnd
        )
    }
}

/// One row of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Authoritative markdown source, without trailing newline
    raw: String,
    /// Cached classification, re-derived by every fence rescan
    kind: LineKind,
}

impl Line {
    /// Create a line classified as if it were outside any fence.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = classify_block(&raw);
        Self { raw, kind }
    }

    /// The raw markdown text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The block kind.
    pub const fn kind(&self) -> &LineKind {
        &self.kind
    }

    /// Length of the raw text in characters.
    pub fn char_len(&self) -> usize {
        self.raw.chars().count()
    }

    pub(crate) fn set_kind(&mut self, kind: LineKind) {
        self.kind = kind;
    }
}

/// Reference to a heading in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRef {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text (plain, no formatting)
    pub text: String,
    /// Line index in the document
    pub line: usize,
}

/// The ordered sequence of lines backing one editor.
///
/// Never empty: an empty document holds exactly one empty `Normal` line so
/// a caret position always exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
}

impl Document {
    /// Create an empty document.
    pub fn empty() -> Self {
        Self {
            lines: vec![Line::new("")],
        }
    }

    /// Create a document from markdown, one line per `\n` segment.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut doc = Self::empty();
        doc.set_content(markdown);
        doc
    }

    /// Replace the whole document.
    pub fn set_content(&mut self, markdown: &str) {
        self.lines = markdown.split('\n').map(Line::new).collect();
        self.rescan();
    }

    /// Serialize back to markdown.
    pub fn markdown(&self) -> String {
        let raws: Vec<&str> = self.lines.iter().map(Line::raw).collect();
        raws.join("\n")
    }

    /// Number of lines (always at least one).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get a specific line by index.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Raw text of a line, empty when out of range.
    pub fn raw(&self, index: usize) -> &str {
        self.lines.get(index).map_or("", Line::raw)
    }

    /// All lines in order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Index of the last line.
    pub fn last_index(&self) -> usize {
        self.lines.len() - 1
    }

    /// Replace one line's raw text.
    ///
    /// Returns the indices whose kind changed in the follow-up rescan. The
    /// edited line itself is always included.
    pub fn set_raw(&mut self, index: usize, raw: impl Into<String>) -> Vec<usize> {
        let Some(line) = self.lines.get_mut(index) else {
            return Vec::new();
        };
        *line = Line::new(raw);
        let mut changed = self.rescan();
        if !changed.contains(&index) {
            changed.push(index);
        }
        changed
    }

    /// Insert a line before `index` (or at the end when `index` is past it).
    pub fn insert_line(&mut self, index: usize, raw: impl Into<String>) -> Vec<usize> {
        let index = index.min(self.lines.len());
        self.lines.insert(index, Line::new(raw));
        self.rescan()
    }

    /// Remove a line. The last remaining line is cleared instead.
    pub fn remove_line(&mut self, index: usize) -> Vec<usize> {
        if index >= self.lines.len() {
            return Vec::new();
        }
        if self.lines.len() == 1 {
            return self.set_raw(0, "");
        }
        self.lines.remove(index);
        self.rescan()
    }

    /// Re-derive fence classification for every line.
    pub fn rescan(&mut self) -> Vec<usize> {
        super::fence::rescan(&mut self.lines)
    }

    /// All headings with their plain text.
    pub fn headings(&self) -> Vec<HeadingRef> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(line, l)| {
                let LineKind::Heading(level) = l.kind() else {
                    return None;
                };
                let (_, prefix) = parse_heading(l.raw())?;
                Some(HeadingRef {
                    level: *level,
                    text: crate::render::plain_text(&l.raw()[prefix..]),
                    line,
                })
            })
            .collect()
    }

    /// Plain text of the first level-one heading.
    pub fn title(&self) -> Option<String> {
        self.headings()
            .into_iter()
            .find(|h| h.level == 1)
            .map(|h| h.text)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_one_line() {
        let doc = Document::empty();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.raw(0), "");
        assert_eq!(doc.markdown(), "");
    }

    #[test]
    fn test_set_content_empty_string_keeps_one_line() {
        let mut doc = Document::from_markdown("a\nb");
        doc.set_content("");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line(0).unwrap().kind(), &LineKind::Normal);
    }

    #[test]
    fn test_markdown_roundtrip_keeps_blank_lines() {
        let md = "# Title\n\n\nbody\n";
        let doc = Document::from_markdown(md);
        assert_eq!(doc.line_count(), 5);
        assert_eq!(doc.markdown(), md);
    }

    #[test]
    fn test_set_raw_reports_edited_line() {
        let mut doc = Document::from_markdown("one\ntwo");
        let changed = doc.set_raw(1, "## two");
        assert_eq!(changed, vec![1]);
        assert_eq!(doc.line(1).unwrap().kind(), &LineKind::Heading(2));
    }

    #[test]
    fn test_set_raw_opening_fence_reclassifies_following_lines() {
        let mut doc = Document::from_markdown("x\n# a\n- b");
        let changed = doc.set_raw(0, "```");
        assert!(changed.contains(&0));
        assert!(changed.contains(&1));
        assert!(changed.contains(&2));
        assert_eq!(doc.line(1).unwrap().kind(), &LineKind::FenceContent);
    }

    #[test]
    fn test_remove_last_line_clears_it() {
        let mut doc = Document::from_markdown("only");
        doc.remove_line(0);
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.markdown(), "");
    }

    #[test]
    fn test_insert_line_past_end_appends() {
        let mut doc = Document::from_markdown("a");
        doc.insert_line(10, "b");
        assert_eq!(doc.markdown(), "a\nb");
    }

    #[test]
    fn test_headings_use_plain_text() {
        let doc = Document::from_markdown("# Hello **bold** world\ntext\n## Sub");
        let headings = doc.headings();
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].text, "Hello bold world");
        assert_eq!(headings[1].line, 2);
        assert_eq!(doc.title().as_deref(), Some("Hello bold world"));
    }

    #[test]
    fn test_heading_inside_fence_is_not_a_heading() {
        let doc = Document::from_markdown("```\n# not a heading\n```");
        assert!(doc.headings().is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn markdown_roundtrip(s in "[a-z#>`*| \\-\\n]{0,80}") {
                let doc = Document::from_markdown(&s);
                prop_assert_eq!(doc.markdown(), s);
                prop_assert!(doc.line_count() >= 1);
            }
        }
    }
}

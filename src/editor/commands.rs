//! Editing commands: Enter, indentation, formatting and block inserts.

use crate::collab::NotifyLevel;
use crate::document::{
    LineKind, image_markdown, parse_blockquote, parse_heading, parse_list_marker,
};
use crate::render::is_safe_url;
use crate::selection::CursorState;
use crate::surface::EditableSurface;

use super::Editor;
use super::text::{char_len, run_after, run_before, slice, splice, split_at_char};

const INDENT: &str = "    ";

const TABLE_SKELETON: [&str; 3] = [
    "| Column 1 | Column 2 |",
    "| -------- | -------- |",
    "|          |          |",
];

/// Inline formatting that wraps text in a marker pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Highlight,
}

impl FormatKind {
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Bold => "**",
            Self::Italic => "*",
            Self::Strikethrough => "~~",
            Self::Code => "`",
            Self::Highlight => "==",
        }
    }
}

/// List flavour for [`Editor::toggle_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Bullet,
    Ordered,
    Task,
}

impl<S: EditableSurface> Editor<S> {
    /// Enter key. What happens depends on the caret line's kind:
    ///
    /// - fence end or start: open a new line after it
    /// - empty line inside a fence: leave the fence, continuing below its end
    /// - list item: continue the list, or end it when the item is empty
    /// - anything else: split the line at the caret
    pub fn enter(&mut self) {
        if !self.is_editable() {
            return;
        }
        let cursor = self.cursor();
        let line = cursor.line;
        let (start, end) = cursor.range();
        let raw = splice(self.doc.raw(line), start, end, "");
        let Some(kind) = self.doc.line(line).map(|l| l.kind().clone()) else {
            return;
        };
        tracing::debug!(line, ?kind, "enter");

        let next = match kind {
            LineKind::FenceEnd | LineKind::FenceStart { .. } => {
                self.insert_line(line + 1, "");
                CursorState::caret(line + 1, 0)
            }
            LineKind::FenceContent if raw.is_empty() => self.exit_fence(line),
            LineKind::ListItem { .. } => self.continue_list(line, &raw, start),
            _ => self.split_line(line, &raw, start, ""),
        };
        self.finish(next);
    }

    /// Drop the empty fence line and open a normal line after the fence.
    fn exit_fence(&mut self, line: usize) -> CursorState {
        let fence_end = (line + 1..self.doc.line_count())
            .find(|&i| self.doc.line(i).is_some_and(|l| *l.kind() == LineKind::FenceEnd));
        self.remove_line(line);
        let target = fence_end.map_or(self.doc.line_count(), |end| end);
        self.insert_line(target, "");
        CursorState::caret(target, 0)
    }

    fn continue_list(&mut self, line: usize, raw: &str, offset: usize) -> CursorState {
        let Some(marker) = parse_list_marker(raw) else {
            return self.split_line(line, raw, offset, "");
        };
        if marker.content.trim().is_empty() {
            self.set_line(line, "");
            return CursorState::caret(line, 0);
        }
        let prefix_chars = char_len(&raw[..marker.prefix_len]);
        if offset == 0 {
            self.insert_line(line, "");
            return CursorState::caret(line + 1, 0);
        }
        let continuation = marker.continuation();
        self.split_line(line, raw, offset.max(prefix_chars), &continuation)
    }

    /// Keep the text before `offset`, move the rest to a new line after
    /// `prefix`.
    fn split_line(&mut self, line: usize, raw: &str, offset: usize, prefix: &str) -> CursorState {
        let (head, tail) = split_at_char(raw, offset);
        let (head, tail) = (head.to_string(), format!("{prefix}{tail}"));
        self.set_line(line, head);
        self.insert_line(line + 1, tail);
        CursorState::caret(line + 1, char_len(prefix))
    }

    /// Tab: indent the caret line by four spaces.
    pub fn indent(&mut self) {
        if !self.is_editable() {
            return;
        }
        let cursor = self.cursor();
        let raw = format!("{INDENT}{}", self.doc.raw(cursor.line));
        self.set_line(cursor.line, raw);
        self.finish(shift(cursor, 4, true));
    }

    /// Shift+Tab: remove four leading spaces, or one leading tab.
    pub fn outdent(&mut self) {
        if !self.is_editable() {
            return;
        }
        let cursor = self.cursor();
        let raw = self.doc.raw(cursor.line);
        let removed = if raw.starts_with(INDENT) {
            INDENT.len()
        } else if raw.starts_with('\t') {
            1
        } else {
            return;
        };
        let raw = raw[removed..].to_string();
        self.set_line(cursor.line, raw);
        self.finish(shift(cursor, removed, false));
    }

    /// Wrap or unwrap the selection in `kind`'s marker. Without a
    /// selection an empty marker pair is inserted around the caret.
    pub fn toggle_format(&mut self, kind: FormatKind) {
        if !self.is_editable() {
            return;
        }
        let cursor = self.cursor();
        let line = cursor.line;
        let raw = self.doc.raw(line).to_string();
        let marker = kind.marker();
        let m = char_len(marker);
        let (start, end) = cursor.range();

        if !cursor.has_selection() {
            self.set_line(line, splice(&raw, start, start, &marker.repeat(2)));
            self.finish(CursorState::caret(line, start + m));
            return;
        }

        let marker_char = marker.chars().next().unwrap_or('*');
        let accepts = |run: usize| run >= m && (m > 1 || run % 2 == 1);
        let selected = slice(&raw, start, end);

        let (updated, next) = if accepts(run_before(&raw, start, marker_char))
            && accepts(run_after(&raw, end, marker_char))
        {
            let unwrapped = splice(&splice(&raw, end, end + m, ""), start - m, start, "");
            (unwrapped, (start - m, end - m))
        } else if char_len(selected) >= 2 * m
            && selected.starts_with(marker)
            && selected.ends_with(marker)
        {
            let inner = slice(selected, m, char_len(selected) - m).to_string();
            (splice(&raw, start, end, &inner), (start, end - 2 * m))
        } else {
            let wrapped = format!("{marker}{selected}{marker}");
            (splice(&raw, start, end, &wrapped), (start + m, end + m))
        };
        tracing::debug!(?kind, line, "toggle format");
        self.set_line(line, updated);
        self.finish(CursorState::caret(line, next.1).with_anchor(next.0));
    }

    /// Set the caret line's heading level; the same level again removes it.
    pub fn insert_heading(&mut self, level: u8) {
        if !self.is_editable() {
            return;
        }
        let level = level.clamp(1, 6);
        let current = parse_heading(self.doc.raw(self.cursor().line)).map(|(l, _)| l);
        self.apply_heading((current != Some(level)).then_some(level));
    }

    /// Step the caret line through none, H1 .. H6, none.
    pub fn cycle_heading(&mut self) {
        if !self.is_editable() {
            return;
        }
        let next = match parse_heading(self.doc.raw(self.cursor().line)) {
            None => Some(1),
            Some((6, _)) => None,
            Some((level, _)) => Some(level + 1),
        };
        self.apply_heading(next);
    }

    fn apply_heading(&mut self, level: Option<u8>) {
        let cursor = self.cursor();
        let raw = self.doc.raw(cursor.line);
        let prefix_len = parse_heading(raw).map_or(0, |(_, len)| len);
        let old_prefix = char_len(&raw[..prefix_len]);
        let content = raw[prefix_len..].to_string();
        let prefix = level.map_or_else(String::new, |l| format!("{} ", "#".repeat(usize::from(l))));
        self.set_line(cursor.line, format!("{prefix}{content}"));
        self.finish(reprefix(cursor, old_prefix, prefix.len()));
    }

    /// Turn the caret line into a list item of `style`, or back into plain
    /// text when it already is one.
    pub fn toggle_list(&mut self, style: ListStyle) {
        if !self.is_editable() {
            return;
        }
        let cursor = self.cursor();
        let line = cursor.line;
        let raw = self.doc.raw(line).to_string();
        let (indent, content, old_prefix, current) = match parse_list_marker(&raw) {
            Some(m) => {
                let current = match (m.task, m.is_ordered()) {
                    (Some(_), _) => ListStyle::Task,
                    (None, true) => ListStyle::Ordered,
                    (None, false) => ListStyle::Bullet,
                };
                (m.indent, m.content, char_len(&raw[..m.prefix_len]), Some(current))
            }
            None => ("", raw.as_str(), 0, None),
        };
        let prefix = if current == Some(style) {
            indent.to_string()
        } else {
            match style {
                ListStyle::Bullet => format!("{indent}- "),
                ListStyle::Task => format!("{indent}- [ ] "),
                ListStyle::Ordered => format!("{indent}{}. ", self.next_ordinal(line, indent)),
            }
        };
        let updated = format!("{prefix}{content}");
        self.set_line(line, updated);
        self.finish(reprefix(cursor, old_prefix, char_len(&prefix)));
    }

    /// Ordinal continuing an ordered item directly above at the same indent.
    fn next_ordinal(&self, line: usize, indent: &str) -> u64 {
        line.checked_sub(1)
            .and_then(|prev| parse_list_marker(self.doc.raw(prev)).filter(|m| m.indent == indent)?.number())
            .map_or(1, |n| n.saturating_add(1))
    }

    /// Add or remove the `> ` prefix.
    pub fn toggle_blockquote(&mut self) {
        if !self.is_editable() {
            return;
        }
        let cursor = self.cursor();
        let raw = self.doc.raw(cursor.line);
        let (updated, old_prefix, new_prefix) = if let Some(len) = parse_blockquote(raw) {
            (raw[len..].to_string(), char_len(&raw[..len]), 0)
        } else if raw == ">" {
            (String::new(), 1, 0)
        } else {
            (format!("> {raw}"), 0, 2)
        };
        self.set_line(cursor.line, updated);
        self.finish(reprefix(cursor, old_prefix, new_prefix));
    }

    /// Insert an empty fenced code block and put the caret inside it.
    pub fn insert_code_block(&mut self) {
        if !self.is_editable() {
            return;
        }
        let first = self.insert_block(&["```", "", "```"]);
        self.finish(CursorState::caret(first + 1, 0));
    }

    /// Insert a horizontal rule followed by an empty line for the caret.
    pub fn insert_hr(&mut self) {
        if !self.is_editable() {
            return;
        }
        let first = self.insert_block(&["---", ""]);
        self.finish(CursorState::caret(first + 1, 0));
    }

    /// Insert a two-column table skeleton; the caret lands in the body row.
    pub fn insert_table(&mut self) {
        if !self.is_editable() {
            return;
        }
        let first = self.insert_block(&TABLE_SKELETON);
        self.finish(CursorState::caret(first + 2, 2));
    }

    /// Place block lines on the caret line when it is empty, otherwise
    /// after it. Returns the index of the first block line.
    fn insert_block(&mut self, lines: &[&str]) -> usize {
        let line = self.cursor().line;
        let Some((head, tail)) = lines.split_first() else {
            return line;
        };
        let (first, rest) = if self.doc.raw(line).is_empty() {
            self.set_line(line, *head);
            (line, tail)
        } else {
            (line + 1, lines)
        };
        let offset = usize::from(first == line);
        for (i, raw) in rest.iter().enumerate() {
            self.insert_line(first + offset + i, *raw);
        }
        first
    }

    /// Ask for a URL and insert a link over the selection (or a
    /// placeholder text).
    pub fn insert_link(&mut self) {
        if !self.is_editable() {
            return;
        }
        let Some(url) = self.ask_url("Link URL", "https://") else {
            return;
        };
        let cursor = self.cursor();
        let (start, end) = cursor.range();
        let selected = slice(self.doc.raw(cursor.line), start, end);
        let label = if selected.is_empty() { "link" } else { selected };
        let link = format!("[{label}]({url})");
        self.insert_text(&link);
    }

    /// Insert an image. An unsafe URL is refused with an error notice.
    pub fn insert_image(&mut self, url: &str, alt: &str) {
        if !self.is_editable() {
            return;
        }
        if url.trim().is_empty() || !is_safe_url(url) {
            self.notifier.notify(NotifyLevel::Error, "Refusing unsafe image URL");
            return;
        }
        self.insert_text(&image_markdown(alt, url.trim()));
    }

    /// Ask for an image URL, then insert it.
    pub fn prompt_image(&mut self) {
        if !self.is_editable() {
            return;
        }
        if let Some(url) = self.ask_url("Image URL", "https://") {
            self.insert_image(&url, "image");
        }
    }

    fn ask_url(&self, message: &str, default: &str) -> Option<String> {
        let url = self.prompt.prompt(message, default)?;
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        if !is_safe_url(url) {
            self.notifier.notify(NotifyLevel::Error, "Refusing unsafe URL");
            return None;
        }
        Some(url.to_string())
    }

    /// Replace the selection (or insert at the caret) with single-line text.
    pub(super) fn insert_text(&mut self, text: &str) {
        let cursor = self.cursor();
        let (start, end) = cursor.range();
        let updated = splice(self.doc.raw(cursor.line), start, end, text);
        self.set_line(cursor.line, updated);
        self.finish(CursorState::caret(cursor.line, start + char_len(text)));
    }

    /// Flip a task item's checkbox. This is the one edit a read-only view
    /// accepts, for clickable checkboxes.
    pub fn toggle_task(&mut self, line: usize) {
        if self.torn_down {
            return;
        }
        let cursor = self.cursor();
        let raw = self.doc.raw(line);
        let Some(marker) = parse_list_marker(raw) else {
            return;
        };
        let Some(checked) = marker.task else {
            return;
        };
        let Some(box_start) = raw[..marker.prefix_len].rfind('[') else {
            return;
        };
        let mark = if checked { " " } else { "x" };
        let updated = format!("{}{mark}{}", &raw[..=box_start], &raw[box_start + 2..]);
        self.set_line(line, updated);
        if self.is_read_only() {
            self.history.safe_save(&self.doc.markdown());
            self.emit_change();
        } else {
            self.finish(cursor);
        }
    }
}

/// Move a cursor by `by` characters, saturating at 0.
fn shift(cursor: CursorState, by: usize, forward: bool) -> CursorState {
    let apply = |o: usize| if forward { o + by } else { o.saturating_sub(by) };
    let moved = CursorState::caret(cursor.line, apply(cursor.offset));
    match cursor.anchor {
        Some(anchor) => moved.with_anchor(apply(anchor)),
        None => moved,
    }
}

/// Keep the caret on the same content character after a prefix change.
fn reprefix(cursor: CursorState, old_prefix: usize, new_prefix: usize) -> CursorState {
    let apply = |o: usize| o.saturating_sub(old_prefix) + new_prefix;
    let moved = CursorState::caret(cursor.line, apply(cursor.offset));
    match cursor.anchor {
        Some(anchor) => moved.with_anchor(apply(anchor)),
        None => moved,
    }
}

//! Block-level classification of a single raw line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::LineKind;

/// Three backticks open or close a fenced code block.
pub(crate) const FENCE: &str = "```";

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s").expect("heading pattern"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^>\s").expect("quote pattern"));
// No backreferences in `regex`, so each rule character gets its own branch.
static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$")
        .expect("rule pattern")
});
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)([-*+]|\d+\.)\s(?:\[([ xX])\](?:\s|$))?").expect("list pattern")
});

/// Parsed prefix of a list or task item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarker<'a> {
    /// Leading indentation (spaces or tabs)
    pub indent: &'a str,
    /// The bullet (`-`, `*`, `+`) or ordinal (`3.`)
    pub bullet: &'a str,
    /// Task checkbox state, if this is a task item
    pub task: Option<bool>,
    /// Byte length of the whole marker prefix, including trailing space
    pub prefix_len: usize,
    /// Text after the marker
    pub content: &'a str,
}

impl ListMarker<'_> {
    /// Whether this item uses an ordinal (`1.`) rather than a bullet.
    pub fn is_ordered(&self) -> bool {
        self.bullet.ends_with('.')
    }

    /// The ordinal number of an ordered item.
    pub fn number(&self) -> Option<u64> {
        self.bullet.strip_suffix('.')?.parse().ok()
    }

    /// Marker prefix for the item that follows this one.
    ///
    /// Ordinals are incremented and task boxes restart unchecked.
    pub fn continuation(&self) -> String {
        let bullet = self.number().map_or_else(
            || self.bullet.to_string(),
            |n| format!("{}.", n.saturating_add(1)),
        );
        match self.task {
            Some(_) => format!("{}{bullet} [ ] ", self.indent),
            None => format!("{}{bullet} ", self.indent),
        }
    }
}

/// Split a list item into its marker and content.
pub fn parse_list_marker(raw: &str) -> Option<ListMarker<'_>> {
    let caps = LIST_ITEM.captures(raw)?;
    let whole = caps.get(0)?;
    let task = caps
        .get(3)
        .map(|m| m.as_str().eq_ignore_ascii_case("x"));
    Some(ListMarker {
        indent: caps.get(1).map_or("", |m| m.as_str()),
        bullet: caps.get(2).map_or("", |m| m.as_str()),
        task,
        prefix_len: whole.end(),
        content: &raw[whole.end()..],
    })
}

/// Heading level and the byte length of its `#` prefix (including the space).
pub fn parse_heading(raw: &str) -> Option<(u8, usize)> {
    let caps = HEADING.captures(raw)?;
    let hashes = caps.get(1)?.as_str().len();
    let level = u8::try_from(hashes).ok()?;
    Some((level, caps.get(0)?.end()))
}

/// Byte length of a blockquote's `>` plus the whitespace character after it.
pub fn parse_blockquote(raw: &str) -> Option<usize> {
    BLOCKQUOTE.find(raw).map(|m| m.end())
}

/// Language suffix of a fence marker line, or `None` if the line is no fence.
pub fn fence_marker(raw: &str) -> Option<&str> {
    raw.trim()
        .strip_prefix(FENCE)
        .map(str::trim)
}

/// Classify a line outside of any fence.
///
/// First match wins: heading, blockquote, horizontal rule, list item,
/// table row. Everything else is `Normal`.
pub fn classify_block(raw: &str) -> LineKind {
    if let Some((level, _)) = parse_heading(raw) {
        return LineKind::Heading(level);
    }
    if parse_blockquote(raw).is_some() {
        return LineKind::Blockquote;
    }
    if HORIZONTAL_RULE.is_match(raw) {
        return LineKind::HorizontalRule;
    }
    if let Some(marker) = parse_list_marker(raw) {
        return LineKind::ListItem {
            ordered: marker.is_ordered(),
            task: marker.task,
        };
    }
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|') {
        return LineKind::TableRow;
    }
    LineKind::Normal
}

//! Block-level rendering of a single line.

use crate::document::{Line, LineKind, parse_blockquote, parse_heading, parse_list_marker};

use super::RenderMode;
use super::inline::{render_inline, syntax};
use super::markup::{Element, Node};

/// Render one line to its markup tree.
///
/// The returned element is the line boundary: the host places one per
/// document line, in order.
pub fn render_line(line: &Line, mode: RenderMode) -> Element {
    let mut el = match mode {
        RenderMode::Editable => render_editable(line.raw(), line.kind()),
        RenderMode::ReadOnly => render_read_only(line.raw(), line.kind()),
    };
    if el.char_len() == 0 && !matches!(el.tag(), "hr") && keeps_caret(line.kind(), mode) {
        el.push(Element::new("br"));
    }
    el
}

/// Whether an empty rendering needs a `<br>` to hold a caret.
fn keeps_caret(kind: &LineKind, mode: RenderMode) -> bool {
    match mode {
        RenderMode::Editable => true,
        RenderMode::ReadOnly => matches!(kind, LineKind::Normal | LineKind::FenceContent),
    }
}

fn line_el(tag: &'static str, class: &str) -> Element {
    Element::new(tag).class(format!("md-line {class}").trim_end().to_string())
}

fn push_syntax(el: &mut Element, marker: &str) {
    if !marker.is_empty() {
        el.push(syntax(marker));
    }
}

const fn heading_tag(level: u8) -> &'static str {
    match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    }
}

/// Byte length of the `> ` prefix.
fn quote_prefix_len(raw: &str) -> usize {
    parse_blockquote(raw).unwrap_or(0)
}

fn render_editable(raw: &str, kind: &LineKind) -> Element {
    let mode = RenderMode::Editable;
    match kind {
        LineKind::Normal => line_el("div", "").children(render_inline(raw, mode)),
        LineKind::Heading(level) => {
            let prefix = parse_heading(raw).map_or(0, |(_, len)| len);
            let mut el = line_el("div", &format!("md-h{level}"));
            push_syntax(&mut el, &raw[..prefix]);
            el.children(render_inline(&raw[prefix..], mode))
        }
        LineKind::Blockquote => {
            let prefix = quote_prefix_len(raw);
            let mut el = line_el("div", "md-quote");
            push_syntax(&mut el, &raw[..prefix]);
            el.children(render_inline(&raw[prefix..], mode))
        }
        LineKind::HorizontalRule => {
            let mut el = line_el("div", "md-hr");
            push_syntax(&mut el, raw);
            el
        }
        LineKind::ListItem { task, .. } => {
            let Some(marker) = parse_list_marker(raw) else {
                return line_el("div", "md-li").children(render_inline(raw, mode));
            };
            let mut marker_el = Element::new("span")
                .class("md-syntax md-list-marker")
                .child(Node::text(&raw[..marker.prefix_len]));
            if let Some(checked) = task {
                marker_el = marker_el.attr("data-checked", checked.to_string());
            }
            line_el("div", if task.is_some() { "md-li md-task" } else { "md-li" })
                .child(marker_el)
                .children(render_inline(marker.content, mode))
        }
        LineKind::TableRow => render_table_row(raw, mode),
        LineKind::FenceStart { lang } => {
            let mut el = line_el("div", "md-fence-start").attr("data-lang", lang.clone());
            push_syntax(&mut el, raw);
            el
        }
        LineKind::FenceContent => {
            let mut el = line_el("div", "md-fence");
            if !raw.is_empty() {
                el.push(Element::new("code").child(Node::text(raw)));
            }
            el
        }
        LineKind::FenceEnd => {
            let mut el = line_el("div", "md-fence-end");
            push_syntax(&mut el, raw);
            el
        }
    }
}

fn render_read_only(raw: &str, kind: &LineKind) -> Element {
    let mode = RenderMode::ReadOnly;
    match kind {
        LineKind::Normal => line_el("p", "").children(render_inline(raw, mode)),
        LineKind::Heading(level) => {
            let prefix = parse_heading(raw).map_or(0, |(_, len)| len);
            line_el(heading_tag(*level), "").children(render_inline(&raw[prefix..], mode))
        }
        LineKind::Blockquote => line_el("blockquote", "")
            .children(render_inline(&raw[quote_prefix_len(raw)..], mode)),
        LineKind::HorizontalRule => Element::new("hr").class("md-line md-hr"),
        LineKind::ListItem { ordered, task } => {
            let Some(marker) = parse_list_marker(raw) else {
                return line_el("div", "md-li").children(render_inline(raw, mode));
            };
            let depth = marker.indent.replace('\t', "    ").len() / 4;
            let glyph = match task {
                Some(true) => Element::new("span")
                    .class("md-task")
                    .attr("data-checked", "true")
                    .child(Node::text("\u{2611}")),
                Some(false) => Element::new("span")
                    .class("md-task")
                    .attr("data-checked", "false")
                    .child(Node::text("\u{2610}")),
                None if *ordered => Element::new("span")
                    .class("md-bullet")
                    .child(Node::text(marker.bullet)),
                None => Element::new("span")
                    .class("md-bullet")
                    .child(Node::text("\u{2022}")),
            };
            line_el("div", "md-li")
                .attr("data-depth", depth.to_string())
                .child(glyph)
                .child(Node::text(" "))
                .children(render_inline(marker.content, mode))
        }
        LineKind::TableRow => render_table_row(raw, mode),
        LineKind::FenceStart { lang } => line_el("div", "md-fence-start").attr("data-lang", lang.clone()),
        LineKind::FenceContent => line_el("pre", "md-fence").child(Element::new("code").child(Node::text(raw))),
        LineKind::FenceEnd => line_el("div", "md-fence-end"),
    }
}

/// Split on pipes that are not backslash-escaped.
fn split_cells(raw: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, ch) in raw.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            '|' if !escaped => {
                cells.push(&raw[start..i]);
                start = i + 1;
            }
            _ => escaped = false,
        }
    }
    cells.push(&raw[start..]);
    cells
}

fn is_separator_cell(cell: &str) -> bool {
    let cell = cell.trim();
    cell.contains('-') && cell.chars().all(|c| matches!(c, '-' | ':'))
}

fn render_table_row(raw: &str, mode: RenderMode) -> Element {
    let segments = split_cells(raw);
    // Outer segments sit before the first and after the last pipe.
    let inner = &segments[1..segments.len().saturating_sub(1).max(1)];
    let separator = !inner.is_empty() && inner.iter().all(|c| is_separator_cell(c));
    let class = if separator { "md-table-sep" } else { "md-table-row" };

    match mode {
        RenderMode::Editable => {
            let mut el = line_el("div", class);
            let last = segments.len() - 1;
            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    el.push(syntax("|"));
                }
                if segment.is_empty() {
                    continue;
                }
                if i == 0 || i == last {
                    el.push(Node::text(*segment));
                } else {
                    el.push(
                        Element::new("span")
                            .class("md-cell")
                            .children(render_inline(segment, mode)),
                    );
                }
            }
            el
        }
        RenderMode::ReadOnly if separator => line_el("div", class),
        RenderMode::ReadOnly => line_el("div", class).children(inner.iter().map(|cell| {
            Element::new("span")
                .class("md-cell")
                .children(render_inline(cell.trim(), mode))
                .into()
        })),
    }
}

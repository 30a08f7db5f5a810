//! Inline span rendering.
//!
//! Rules run in a fixed order, longest marker first. Each rule consumes its
//! non-overlapping matches left to right; the text between matches and the
//! inner content of a match are handed to the remaining rules only.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::RenderMode;
use super::escape::{is_safe_url, link_destination};
use super::markup::{Element, Node};

type Builder = fn(&Captures<'_>, RenderMode, &[Rule], &mut Vec<Node>);

/// One inline syntax rule.
pub(crate) struct Rule {
    name: &'static str,
    pattern: Regex,
    build: Builder,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

fn rule(name: &'static str, pattern: &str, build: Builder) -> Rule {
    Rule {
        name,
        pattern: Regex::new(pattern).unwrap_or_else(|err| panic!("{name} pattern: {err}")),
        build,
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(
            "bold_italic",
            r"\*\*\*(\S(?:.*?\S)?)\*\*\*|___(\S(?:.*?\S)?)___",
            build_bold_italic,
        ),
        rule(
            "bold",
            r"\*\*(\S(?:.*?\S)?)\*\*|__(\S(?:.*?\S)?)__",
            build_bold,
        ),
        rule(
            "italic",
            r"\*([^*\s](?:[^*]*?[^*\s])?)\*|\b_([^_\s](?:[^_]*?[^_\s])?)_\b",
            build_italic,
        ),
        rule("strikethrough", r"~~(\S(?:.*?\S)?)~~", build_strikethrough),
        rule("code", r"`([^`]+)`", build_code),
        rule("highlight", r"==(\S(?:.*?\S)?)==", build_highlight),
        rule(
            "image",
            r"!\[([^\]]*)\]\((<[^>\n]*>|[^)\s]*)\)",
            build_image,
        ),
        rule(
            "link",
            r"\[([^\]]+)\]\((<[^>\n]*>|[^)\s]*)\)",
            build_link,
        ),
    ]
});

/// Render inline markdown into nodes.
pub fn render_inline(text: &str, mode: RenderMode) -> Vec<Node> {
    let mut out = Vec::new();
    apply(text, &RULES, mode, &mut out);
    out
}

fn apply(text: &str, rules: &[Rule], mode: RenderMode, out: &mut Vec<Node>) {
    if text.is_empty() {
        return;
    }
    let Some((current, rest)) = rules.split_first() else {
        push_text(out, text);
        return;
    };
    let mut last = 0;
    for caps in current.pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        apply(&text[last..whole.start()], rest, mode, out);
        (current.build)(&caps, mode, rest, out);
        last = whole.end();
    }
    apply(&text[last..], rest, mode, out);
}

/// Append text, merging with a preceding text node.
fn push_text(out: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Node::text(text));
    }
}

pub(crate) fn syntax(marker: &str) -> Node {
    Element::new("span")
        .class("md-syntax")
        .child(Node::text(marker))
        .into()
}

/// The first participating capture among alternatives.
fn first_group<'t>(caps: &Captures<'t>) -> &'t str {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map_or("", |m| m.as_str())
}

fn wrap_nested(
    caps: &Captures<'_>,
    mode: RenderMode,
    rest: &[Rule],
    out: &mut Vec<Node>,
    tags: &[&'static str],
    marker_len: usize,
) {
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let inner = first_group(caps);
    let marker = &whole[..marker_len];

    let mut content = Vec::new();
    if mode == RenderMode::Editable {
        content.push(syntax(marker));
    }
    apply(inner, rest, mode, &mut content);
    if mode == RenderMode::Editable {
        content.push(syntax(marker));
    }

    let mut nodes = content;
    for tag in tags.iter().rev() {
        nodes = vec![Element::new(tag).children(nodes).into()];
    }
    out.extend(nodes);
}

fn build_bold_italic(caps: &Captures<'_>, mode: RenderMode, rest: &[Rule], out: &mut Vec<Node>) {
    wrap_nested(caps, mode, rest, out, &["strong", "em"], 3);
}

fn build_bold(caps: &Captures<'_>, mode: RenderMode, rest: &[Rule], out: &mut Vec<Node>) {
    wrap_nested(caps, mode, rest, out, &["strong"], 2);
}

fn build_italic(caps: &Captures<'_>, mode: RenderMode, rest: &[Rule], out: &mut Vec<Node>) {
    wrap_nested(caps, mode, rest, out, &["em"], 1);
}

fn build_strikethrough(caps: &Captures<'_>, mode: RenderMode, rest: &[Rule], out: &mut Vec<Node>) {
    wrap_nested(caps, mode, rest, out, &["del"], 2);
}

fn build_highlight(caps: &Captures<'_>, mode: RenderMode, rest: &[Rule], out: &mut Vec<Node>) {
    wrap_nested(caps, mode, rest, out, &["mark"], 2);
}

fn build_code(caps: &Captures<'_>, mode: RenderMode, _rest: &[Rule], out: &mut Vec<Node>) {
    let inner = first_group(caps);
    let mut code = Element::new("code");
    if mode == RenderMode::Editable {
        code.push(syntax("`"));
    }
    code.push(Node::text(inner));
    if mode == RenderMode::Editable {
        code.push(syntax("`"));
    }
    out.push(code.into());
}

fn url_span(raw: &str) -> Node {
    Element::new("span")
        .class("md-url")
        .child(Node::text(raw))
        .into()
}

fn build_image(caps: &Captures<'_>, mode: RenderMode, _rest: &[Rule], out: &mut Vec<Node>) {
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let alt = caps.get(1).map_or("", |m| m.as_str());
    let raw_url = caps.get(2).map_or("", |m| m.as_str());
    let url = link_destination(raw_url);

    if !is_safe_url(url) {
        tracing::debug!(url, "refusing unsafe image url");
        match mode {
            RenderMode::Editable => push_text(out, whole),
            RenderMode::ReadOnly => push_text(out, alt),
        }
        return;
    }

    match mode {
        RenderMode::Editable => out.push(
            Element::new("span")
                .class("md-image")
                .attr("data-src", url)
                .child(syntax("!["))
                .child(Node::text(alt))
                .child(syntax("]("))
                .child(url_span(raw_url))
                .child(syntax(")"))
                .into(),
        ),
        RenderMode::ReadOnly => out.push(
            Element::new("img")
                .attr("src", url)
                .attr("alt", alt)
                .into(),
        ),
    }
}

fn build_link(caps: &Captures<'_>, mode: RenderMode, _rest: &[Rule], out: &mut Vec<Node>) {
    let whole = caps.get(0).map_or("", |m| m.as_str());
    let text = caps.get(1).map_or("", |m| m.as_str());
    let raw_url = caps.get(2).map_or("", |m| m.as_str());
    let url = link_destination(raw_url);

    if !is_safe_url(url) {
        tracing::debug!(url, "refusing unsafe link url");
        match mode {
            RenderMode::Editable => push_text(out, whole),
            RenderMode::ReadOnly => push_text(out, text),
        }
        return;
    }

    match mode {
        RenderMode::Editable => out.push(
            Element::new("span")
                .class("md-link")
                .attr("data-href", url)
                .child(syntax("["))
                .child(Node::text(text))
                .child(syntax("]("))
                .child(url_span(raw_url))
                .child(syntax(")"))
                .into(),
        ),
        RenderMode::ReadOnly => out.push(
            Element::new("a")
                .attr("href", url)
                .attr("rel", "noopener noreferrer")
                .child(Node::text(text))
                .into(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(text: &str, mode: RenderMode) -> String {
        Element::new("p")
            .children(render_inline(text, mode))
            .to_html()
    }

    fn read_only(text: &str) -> String {
        html(text, RenderMode::ReadOnly)
    }

    fn editable(text: &str) -> String {
        html(text, RenderMode::Editable)
    }

    #[test]
    fn test_rule_order_is_longest_marker_first() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "bold_italic",
                "bold",
                "italic",
                "strikethrough",
                "code",
                "highlight",
                "image",
                "link"
            ]
        );
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(read_only("a <b> & c"), "<p>a &lt;b&gt; &amp; c</p>");
    }

    #[test]
    fn test_bold_read_only() {
        assert_eq!(read_only("a **b** c"), "<p>a <strong>b</strong> c</p>");
        assert_eq!(read_only("__b__"), "<p><strong>b</strong></p>");
    }

    #[test]
    fn test_bold_editable_keeps_markers() {
        assert_eq!(
            editable("**b**"),
            "<p><strong><span class=\"md-syntax\">**</span>b<span class=\"md-syntax\">**</span></strong></p>"
        );
    }

    #[test]
    fn test_bold_italic() {
        assert_eq!(read_only("***x***"), "<p><strong><em>x</em></strong></p>");
    }

    #[test]
    fn test_italic_both_markers() {
        assert_eq!(read_only("*a* and _b_"), "<p><em>a</em> and <em>b</em></p>");
    }

    #[test]
    fn test_underscores_inside_words_are_literal() {
        assert_eq!(read_only("snake_case_name"), "<p>snake_case_name</p>");
    }

    #[test]
    fn test_lone_asterisks_are_literal() {
        assert_eq!(read_only("2 * 3 * 4"), "<p>2 * 3 * 4</p>");
    }

    #[test]
    fn test_strikethrough_and_highlight() {
        assert_eq!(read_only("~~gone~~"), "<p><del>gone</del></p>");
        assert_eq!(read_only("==hot=="), "<p><mark>hot</mark></p>");
    }

    #[test]
    fn test_inline_code_escapes_content() {
        assert_eq!(read_only("`<div>`"), "<p><code>&lt;div&gt;</code></p>");
    }

    #[test]
    fn test_link_inside_bold() {
        assert_eq!(
            read_only("**[a](https://x.io)**"),
            "<p><strong><a href=\"https://x.io\" rel=\"noopener noreferrer\">a</a></strong></p>"
        );
    }

    #[test]
    fn test_image_before_link() {
        assert_eq!(
            read_only("![alt](pic.png)"),
            "<p><img src=\"pic.png\" alt=\"alt\"></p>"
        );
    }

    #[test]
    fn test_image_angle_bracket_destination() {
        assert_eq!(
            read_only("![s](<my shot.png>)"),
            "<p><img src=\"my shot.png\" alt=\"s\"></p>"
        );
    }

    #[test]
    fn test_link_captures_escaped_independently() {
        assert_eq!(
            read_only("[a&b <c>](/q?x=1&y=\"2\")"),
            "<p><a href=\"/q?x=1&amp;y=&quot;2&quot;\" rel=\"noopener noreferrer\">a&amp;b &lt;c&gt;</a></p>"
        );
    }

    #[test]
    fn test_no_double_escaping_of_entities() {
        assert_eq!(read_only("**&amp;**"), "<p><strong>&amp;amp;</strong></p>");
        assert_eq!(
            read_only("![&lt;](x.png)"),
            "<p><img src=\"x.png\" alt=\"&amp;lt;\"></p>"
        );
    }

    #[test]
    fn test_javascript_image_is_inert() {
        let out = read_only("![x](javascript:alert(1))");
        assert!(!out.contains("javascript:"), "got {out}");
        assert!(!out.contains("<img"));
    }

    #[test]
    fn test_unsafe_link_schemes_render_as_text() {
        for url in ["javascript:void(0)", "vbscript:x", "data:text/html,hi"] {
            let out = read_only(&format!("[click]({url})"));
            assert!(!out.contains("href"), "{url} produced {out}");
            assert!(out.contains("click"));
        }
    }

    #[test]
    fn test_unsafe_link_editable_keeps_every_character() {
        let raw = "[x](javascript:alert(1))";
        let nodes = render_inline(raw, RenderMode::Editable);
        let el = Element::new("p").children(nodes);
        assert_eq!(el.text_content(), raw);
        assert!(!el.to_html().contains("data-href"));
    }

    #[test]
    fn test_editable_text_content_matches_raw() {
        let raw = "a **b** _c_ `d` ~~e~~ ==f== ![g](h.png) [i](https://j)";
        let el = Element::new("p").children(render_inline(raw, RenderMode::Editable));
        assert_eq!(el.text_content(), raw);
    }

    #[test]
    fn test_adjacent_text_nodes_are_merged() {
        let nodes = render_inline("plain text", RenderMode::ReadOnly);
        assert_eq!(nodes, vec![Node::text("plain text")]);
    }
}

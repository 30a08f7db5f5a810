//! Line rendering.
//!
//! Turns one line's raw markdown and block kind into a markup tree, in one
//! of two modes:
//! - [`RenderMode::Editable`]: every raw character stays visible; syntax
//!   markers are wrapped in `md-syntax` spans so the host can dim them
//! - [`RenderMode::ReadOnly`]: markers are stripped, leaving semantic HTML
//!
//! In editable mode the text content of a rendered line always equals its
//! raw text, which is what the selection mapper relies on.

mod block;
mod escape;
mod inline;
mod markup;

pub use block::render_line;
pub use escape::{escape_html, is_safe_url};
pub use inline::render_inline;
pub use markup::{Element, Node};

/// How syntax markers are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Markers visible, wrapped in syntax spans
    #[default]
    Editable,
    /// Markers stripped, semantic HTML only
    ReadOnly,
}

/// Plain text of inline markdown, with all syntax stripped.
pub fn plain_text(inline: &str) -> String {
    Element::new("span")
        .children(render_inline(inline, RenderMode::ReadOnly))
        .text_content()
        .trim()
        .to_string()
}

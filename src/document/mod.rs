//! Line model for the editing engine.
//!
//! This module handles:
//! - The ordered sequence of editable lines and their raw Markdown text
//! - Block-level classification of a single line
//! - The code-fence state machine that re-derives fence kinds document-wide

mod block;
mod fence;
mod types;

pub use block::{
    ListMarker, classify_block, fence_marker, parse_blockquote, parse_heading, parse_list_marker,
};
pub use fence::{classify_all, rescan};
pub use types::{Document, HeadingRef, Line, LineKind};

/// Image file extensions accepted by paste and drop.
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff", "tif", "ico", "svg", "avif",
];

/// Returns true if the file name carries a recognized image extension.
pub fn is_image_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Generate the markdown that embeds an uploaded image.
///
/// Uses angle brackets around the URL when it contains spaces or
/// parentheses so the link destination stays intact.
pub fn image_markdown(alt: &str, url: &str) -> String {
    if url.contains([' ', '(', ')']) {
        format!("![{alt}](<{url}>)")
    } else {
        format!("![{alt}]({url})")
    }
}

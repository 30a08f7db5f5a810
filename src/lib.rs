// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. history::HistoryManager)
    clippy::module_name_repetitions
)]

//! # Markline
//!
//! An in-place Markdown editing engine.
//!
//! The user edits raw Markdown line by line while every line is shown with
//! its formatting applied. The Markdown text is the single source of truth;
//! the rendered view is re-derived from it after each change.
//!
//! ## Architecture
//!
//! Markline follows The Elm Architecture (TEA) pattern:
//! - **Model**: the [`document::Document`] line model plus cursor and history
//! - **Message**: [`editor::Message`] host events and commands
//! - **Update**: [`editor::Editor::dispatch`]
//! - **View**: per-line rendering into an [`surface::EditableSurface`]
//!
//! ## Modules
//!
//! - [`document`]: Line model, block classification and code-fence state
//! - [`render`]: Inline and block rendering to a markup tree
//! - [`selection`]: Mapping between native selections and raw offsets
//! - [`editor`]: Command handlers and the sync facade
//! - [`history`]: Debounced undo/redo snapshots
//! - [`surface`]: The editable surface seam and an in-memory implementation
//! - [`collab`]: Host collaborators (notifier, prompt, uploader, clock)
//! - [`config`]: Flag-file defaults
//! - [`perf`]: Timing scopes and the debug event log

pub mod collab;
pub mod config;
pub mod document;
pub mod editor;
pub mod history;
pub mod perf;
pub mod render;
pub mod selection;
pub mod surface;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::document::{Document, LineKind};
    pub use crate::editor::{Editor, EditorOptions, Message};
    pub use crate::surface::{EditableSurface, MemorySurface};
}

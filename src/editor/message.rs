use crate::collab::ImageFile;
use crate::selection::CursorState;
use crate::surface::EditableSurface;

use super::commands::{FormatKind, ListStyle};
use super::paste::Clipboard;
use super::Editor;

/// A key the editor may claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Char(char),
    /// Anything the editor never handles (arrows, Backspace, ...)
    Other(String),
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Cmd on macOS, treated like Ctrl
    pub meta: bool,
}

impl KeyPress {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    #[must_use]
    pub const fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub const fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[must_use]
    pub const fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    const fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Events and actions the editor understands.
///
/// Hosts translate their native events into these and pass them to
/// [`Editor::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Host events
    /// A key went down; dispatch reports whether it was consumed
    KeyDown(KeyPress),
    /// The host changed text on the surface
    Input,
    CompositionStart,
    CompositionEnd,
    Paste(Clipboard),
    Drop(Vec<ImageFile>),
    /// Timer tick for the debounced history save
    Tick,
    Focus,
    /// The host moved the caret or selection
    SelectionChanged(CursorState),

    // Commands
    SetContent(String),
    Undo,
    Redo,
    Enter,
    Indent,
    Outdent,
    ToggleFormat(FormatKind),
    InsertHeading(u8),
    CycleHeading,
    ToggleList(ListStyle),
    ToggleBlockquote,
    InsertCodeBlock,
    InsertHr,
    InsertLink,
    InsertImage { url: String, alt: String },
    InsertTable,
    ToggleTask(usize),
}

impl<S: EditableSurface> Editor<S> {
    /// Apply one message. Returns whether it was handled, which for
    /// [`Message::KeyDown`] tells the host to suppress its default action.
    pub fn dispatch(&mut self, msg: Message) -> bool {
        if self.torn_down {
            return false;
        }
        match msg {
            Message::KeyDown(key) => return self.handle_key(&key),
            Message::Input => self.input(),
            Message::CompositionStart => self.composition_start(),
            Message::CompositionEnd => self.composition_end(),
            Message::Paste(clipboard) => self.paste(clipboard),
            Message::Drop(files) => self.drop_files(files),
            Message::Tick => self.tick(),
            Message::Focus => self.focus(),
            Message::SelectionChanged(cursor) => self.set_cursor(cursor),
            Message::SetContent(markdown) => self.set_content(&markdown),
            Message::Undo => self.undo(),
            Message::Redo => self.redo(),
            Message::Enter => self.enter(),
            Message::Indent => self.indent(),
            Message::Outdent => self.outdent(),
            Message::ToggleFormat(kind) => self.toggle_format(kind),
            Message::InsertHeading(level) => self.insert_heading(level),
            Message::CycleHeading => self.cycle_heading(),
            Message::ToggleList(style) => self.toggle_list(style),
            Message::ToggleBlockquote => self.toggle_blockquote(),
            Message::InsertCodeBlock => self.insert_code_block(),
            Message::InsertHr => self.insert_hr(),
            Message::InsertLink => self.insert_link(),
            Message::InsertImage { url, alt } => self.insert_image(&url, &alt),
            Message::InsertTable => self.insert_table(),
            Message::ToggleTask(line) => self.toggle_task(line),
        }
        true
    }

    fn handle_key(&mut self, key: &KeyPress) -> bool {
        if !self.is_editable() || key.alt {
            return false;
        }
        let command = key.command();
        let msg = match &key.key {
            Key::Enter if !command && !key.shift => Message::Enter,
            Key::Tab if !command && key.shift => Message::Outdent,
            Key::Tab if !command => Message::Indent,
            Key::Char(c) if command => match (c.to_ascii_lowercase(), key.shift) {
                ('b', false) => Message::ToggleFormat(FormatKind::Bold),
                ('i', false) => Message::ToggleFormat(FormatKind::Italic),
                ('e', false) => Message::ToggleFormat(FormatKind::Code),
                ('k', false) => Message::InsertLink,
                ('x', true) => Message::ToggleFormat(FormatKind::Strikethrough),
                ('h', true) => Message::ToggleFormat(FormatKind::Highlight),
                ('z', false) => Message::Undo,
                ('z', true) | ('y', false) => Message::Redo,
                _ => return false,
            },
            _ => return false,
        };
        tracing::debug!(?msg, "key binding");
        self.dispatch(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorOptions;
    use crate::surface::MemorySurface;

    fn editor(md: &str) -> Editor<MemorySurface> {
        Editor::new(
            MemorySurface::new(),
            EditorOptions::default().with_initial_value(md),
        )
    }

    #[test]
    fn test_enter_key_is_consumed() {
        let mut ed = editor("a");
        ed.set_caret_offset(0, 1);
        assert!(ed.dispatch(Message::KeyDown(KeyPress::new(Key::Enter))));
        assert_eq!(ed.markdown(), "a\n");
    }

    #[test]
    fn test_shift_enter_is_left_to_host() {
        let mut ed = editor("a");
        assert!(!ed.dispatch(Message::KeyDown(KeyPress::new(Key::Enter).shift())));
    }

    #[test]
    fn test_plain_typing_is_left_to_host() {
        let mut ed = editor("a");
        assert!(!ed.dispatch(Message::KeyDown(KeyPress::new(Key::Char('b')))));
        assert!(!ed.dispatch(Message::KeyDown(KeyPress::new(Key::Other("Backspace".into())))));
    }

    #[test]
    fn test_shift_tab_outdents() {
        let mut ed = editor("    x");
        ed.set_caret_offset(0, 5);
        assert!(ed.dispatch(Message::KeyDown(KeyPress::new(Key::Tab).shift())));
        assert_eq!(ed.markdown(), "x");
    }

    #[test]
    fn test_command_b_bolds_selection() {
        let mut ed = editor("word");
        ed.dispatch(Message::SelectionChanged(CursorState::caret(0, 4).with_anchor(0)));
        assert!(ed.dispatch(Message::KeyDown(KeyPress::new(Key::Char('b')).meta())));
        assert_eq!(ed.markdown(), "**word**");
    }

    #[test]
    fn test_ctrl_shift_x_strikes() {
        let mut ed = editor("");
        ed.dispatch(Message::KeyDown(KeyPress::new(Key::Char('X')).ctrl().shift()));
        assert_eq!(ed.markdown(), "~~~~");
    }

    #[test]
    fn test_undo_redo_bindings() {
        let mut ed = editor("a");
        ed.dispatch(Message::Paste(Clipboard::text("b")));
        ed.dispatch(Message::KeyDown(KeyPress::new(Key::Char('z')).ctrl()));
        assert_eq!(ed.markdown(), "a");
        ed.dispatch(Message::KeyDown(KeyPress::new(Key::Char('y')).ctrl()));
        assert_eq!(ed.markdown(), "ba");
    }

    #[test]
    fn test_read_only_claims_no_keys() {
        let mut ed = Editor::new(
            MemorySurface::new(),
            EditorOptions::default().with_read_only(true),
        );
        assert!(!ed.dispatch(Message::KeyDown(KeyPress::new(Key::Enter))));
    }

    #[test]
    fn test_command_messages_route_to_methods() {
        let mut ed = editor("");
        ed.dispatch(Message::InsertHeading(2));
        ed.dispatch(Message::InsertImage {
            url: "a.png".into(),
            alt: "a".into(),
        });
        assert_eq!(ed.markdown(), "## ![a](a.png)");
    }

    #[test]
    fn test_torn_down_editor_handles_nothing() {
        let mut ed = editor("");
        ed.teardown();
        assert!(!ed.dispatch(Message::Enter));
    }
}

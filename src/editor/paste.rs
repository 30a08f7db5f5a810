//! Paste, drop, image uploads and host text input.

use crate::collab::{ImageFile, ImageUploader, NotifyLevel, UploadError};
use crate::document::image_markdown;
use crate::perf::EngineEvent;
use crate::render::is_safe_url;
use crate::selection::{self, CursorState};
use crate::surface::EditableSurface;

use super::Editor;
use super::text::{char_len, splice, split_at_char};

/// Clipboard contents offered by a paste event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    pub text: String,
    pub files: Vec<ImageFile>,
}

impl Clipboard {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
        }
    }

    pub fn image(file: ImageFile) -> Self {
        Self {
            text: String::new(),
            files: vec![file],
        }
    }
}

/// An image waiting for its upload to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub id: u64,
    pub image: ImageFile,
}

impl<S: EditableSurface> Editor<S> {
    /// Paste. Images go to the upload queue; text is spliced in at the
    /// caret, replacing any same-line selection.
    pub fn paste(&mut self, clipboard: Clipboard) {
        if !self.is_editable() {
            return;
        }
        let images: Vec<ImageFile> = clipboard.files.into_iter().filter(ImageFile::is_image).collect();
        if !images.is_empty() {
            for image in images {
                self.queue_upload(image);
            }
            return;
        }
        let text = clipboard.text.replace("\r\n", "\n");
        if text.is_empty() {
            return;
        }
        self.insert_multiline(&text);
    }

    /// Insert text that may span lines. The caret ends after the inserted
    /// text, with the original tail following it.
    fn insert_multiline(&mut self, text: &str) {
        let cursor = self.cursor();
        let line = cursor.line;
        let (start, end) = cursor.range();
        let raw = splice(self.doc.raw(line), start, end, "");
        let pieces: Vec<&str> = text.split('\n').collect();
        let [first, middle @ .., last] = pieces.as_slice() else {
            let updated = splice(&raw, start, start, text);
            self.set_line(line, updated);
            self.finish(CursorState::caret(line, start + char_len(text)));
            return;
        };
        let (head, tail) = split_at_char(&raw, start);
        let (head, tail) = (head.to_string(), tail.to_string());
        tracing::debug!(line, lines = pieces.len(), "multi-line paste");

        self.set_line(line, format!("{head}{first}"));
        for (i, piece) in middle.iter().enumerate() {
            self.insert_line(line + 1 + i, *piece);
        }
        let last_index = line + pieces.len() - 1;
        self.insert_line(last_index, format!("{last}{tail}"));
        self.finish(CursorState::caret(last_index, char_len(last)));
    }

    /// Drop. Every image file is queued for upload; others are skipped.
    pub fn drop_files(&mut self, files: Vec<ImageFile>) {
        if !self.is_editable() {
            return;
        }
        for file in files {
            if file.is_image() {
                self.queue_upload(file);
            } else {
                tracing::debug!(name = %file.name, "skipping dropped non-image");
            }
        }
    }

    fn queue_upload(&mut self, image: ImageFile) -> u64 {
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.notifier
            .notify(NotifyLevel::Info, &format!("Uploading {}...", image.name));
        EngineEvent::UploadQueued {
            id,
            name: &image.name,
        }
        .record();
        self.uploads.push(UploadTicket { id, image });
        id
    }

    /// Uploads not yet finished, oldest first.
    pub fn pending_uploads(&self) -> &[UploadTicket] {
        &self.uploads
    }

    /// Complete an upload. On success the image is inserted at the caret
    /// as it is now, which may differ from where it was when the upload
    /// began. Returns false for an unknown ticket.
    pub fn finish_upload(&mut self, id: u64, result: Result<String, UploadError>) -> bool {
        let Some(pos) = self.uploads.iter().position(|t| t.id == id) else {
            return false;
        };
        let ticket = self.uploads.remove(pos);
        EngineEvent::UploadFinished {
            id,
            ok: result.is_ok(),
        }
        .record();
        match result {
            Ok(url) if !url.trim().is_empty() && is_safe_url(&url) => {
                if self.is_editable() {
                    let markdown = image_markdown(ticket.image.stem(), &url);
                    self.insert_text(&markdown);
                    self.notifier.notify(NotifyLevel::Success, "Image uploaded");
                }
            }
            Ok(url) => {
                tracing::warn!(url, "upload returned an unsafe url");
                self.notifier
                    .notify(NotifyLevel::Error, "Upload returned an unusable URL");
            }
            Err(err) => {
                tracing::warn!(%err, name = %ticket.image.name, "upload failed");
                self.notifier
                    .notify(NotifyLevel::Error, &format!("Upload failed: {err}"));
            }
        }
        true
    }

    /// Drive every queued upload through `uploader`, one after another.
    pub fn run_uploads(&mut self, uploader: &dyn ImageUploader) {
        while let Some(ticket) = self.uploads.first().cloned() {
            let result = uploader.upload(&ticket.image);
            self.finish_upload(ticket.id, result);
        }
    }

    /// The host changed text on the surface directly. Read the caret line
    /// back into the document and re-render it.
    ///
    /// While an IME composition is active the line is not re-rendered, so
    /// the host's composition text is left alone.
    pub fn input(&mut self) {
        if !self.is_editable() {
            return;
        }
        // Unclamped: the host text may already be longer than the raw line.
        let cursor = selection::read_cursor(&self.surface).unwrap_or(self.cursor);
        let line = cursor.line;
        let Some(text) = self.surface.line_text(line) else {
            return;
        };
        if text == self.doc.raw(line) {
            return;
        }
        let mut pieces = text.split('\n');
        let first = pieces.next().unwrap_or_default().to_string();
        let rest: Vec<String> = pieces.map(ToOwned::to_owned).collect();

        if self.composing && rest.is_empty() {
            let changed = self.doc.set_raw(line, first);
            let others: Vec<usize> = changed.into_iter().filter(|&i| i != line).collect();
            self.refresh_lines(&others);
            self.cursor = cursor;
            self.history.note_edit(self.clock.now_ms());
            self.emit_change();
            return;
        }

        self.set_line(line, first);
        let next = if rest.is_empty() {
            cursor
        } else {
            for (i, piece) in rest.iter().enumerate() {
                self.insert_line(line + 1 + i, piece.clone());
            }
            CursorState::caret(line + rest.len(), 0)
        };
        self.finish(next);
    }

    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    /// End of IME input: render the composed line and snapshot at once.
    pub fn composition_end(&mut self) {
        if !self.composing {
            return;
        }
        self.composing = false;
        if self.is_editable() {
            self.input();
            let cursor = self.cursor();
            self.refresh_lines(&[cursor.line]);
            self.place_cursor(cursor);
        }
        self.safe_save_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::RecordingNotifier;
    use crate::editor::EditorOptions;
    use crate::surface::MemorySurface;

    struct FixedUploader(Result<String, UploadError>);

    impl ImageUploader for FixedUploader {
        fn upload(&self, _image: &ImageFile) -> Result<String, UploadError> {
            self.0.clone()
        }
    }

    fn editor(md: &str) -> Editor<MemorySurface> {
        Editor::new(
            MemorySurface::new(),
            EditorOptions::default().with_initial_value(md),
        )
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![0x89, b'P'])
    }

    #[test]
    fn test_single_line_paste_splices_at_caret() {
        let mut ed = editor("abcd");
        ed.set_caret_offset(0, 2);
        ed.paste(Clipboard::text("XY"));
        assert_eq!(ed.markdown(), "abXYcd");
        assert_eq!(ed.cursor(), CursorState::caret(0, 4));
    }

    #[test]
    fn test_three_line_paste_keeps_interior_lines() {
        let mut ed = editor("ab");
        ed.set_caret_offset(0, 1);
        ed.paste(Clipboard::text("1\r\n2\r\n3"));
        assert_eq!(ed.markdown(), "a1\n2\n3b");
        assert_eq!(ed.cursor(), CursorState::caret(2, 1));
    }

    #[test]
    fn test_paste_replaces_selection() {
        let mut ed = editor("hello world");
        ed.set_cursor(CursorState::caret(0, 11).with_anchor(6));
        ed.paste(Clipboard::text("there"));
        assert_eq!(ed.markdown(), "hello there");
    }

    #[test]
    fn test_paste_opening_fence_reclassifies_following_lines() {
        let mut ed = editor("\nafter");
        ed.set_caret_offset(0, 0);
        ed.paste(Clipboard::text("```"));
        let kinds: Vec<_> = ed.document().lines().iter().map(|l| l.kind().clone()).collect();
        assert_eq!(kinds[1], crate::document::LineKind::FenceContent);
        let markup = ed.surface().line_markup(1).unwrap();
        assert_eq!(markup.get_attr("class"), Some("md-line md-fence"));
    }

    #[test]
    fn test_image_paste_queues_upload_instead_of_text() {
        let mut ed = editor("x");
        ed.paste(Clipboard {
            text: "ignored".into(),
            files: vec![png("shot.png")],
        });
        assert_eq!(ed.markdown(), "x");
        assert_eq!(ed.pending_uploads().len(), 1);
    }

    #[test]
    fn test_upload_inserts_at_caret_current_at_completion() {
        let mut ed = editor("ab");
        ed.set_caret_offset(0, 0);
        ed.paste(Clipboard::image(png("cat.png")));
        let id = ed.pending_uploads()[0].id;
        ed.set_caret_offset(0, 2);
        assert!(ed.finish_upload(id, Ok("/img/cat.png".into())));
        assert_eq!(ed.markdown(), "ab![cat](/img/cat.png)");
        assert!(ed.pending_uploads().is_empty());
    }

    #[test]
    fn test_failed_upload_notifies_and_leaves_text() {
        let notifier = RecordingNotifier::default();
        let mut ed = Editor::new(
            MemorySurface::new(),
            EditorOptions::default()
                .with_initial_value("x")
                .with_notifier(notifier.clone()),
        );
        ed.drop_files(vec![png("a.png")]);
        ed.run_uploads(&FixedUploader(Err(UploadError::Transport("offline".into()))));
        assert_eq!(ed.markdown(), "x");
        let messages = notifier.messages();
        assert_eq!(messages.last().map(|m| m.0), Some(NotifyLevel::Error));
    }

    #[test]
    fn test_drop_uploads_sequentially_and_skips_non_images() {
        let mut ed = editor("");
        ed.drop_files(vec![
            png("one.png"),
            ImageFile::new("notes.txt", "text/plain", vec![]),
            png("two.png"),
        ]);
        assert_eq!(ed.pending_uploads().len(), 2);
        ed.run_uploads(&FixedUploader(Ok("u.png".into())));
        assert_eq!(ed.markdown(), "![one](u.png)![two](u.png)");
    }

    #[test]
    fn test_unsafe_upload_url_is_refused() {
        let mut ed = editor("");
        ed.paste(Clipboard::image(png("x.png")));
        ed.run_uploads(&FixedUploader(Ok("javascript:alert(1)".into())));
        assert_eq!(ed.markdown(), "");
    }

    #[test]
    fn test_unknown_ticket_is_rejected() {
        let mut ed = editor("");
        assert!(!ed.finish_upload(42, Ok("a.png".into())));
    }

    #[test]
    fn test_input_reads_line_back_and_rerenders() {
        let mut ed = editor("# Titl");
        ed.set_caret_offset(0, 6);
        ed.surface_mut().type_text("e");
        ed.input();
        assert_eq!(ed.markdown(), "# Title");
        let markup = ed.surface().line_markup(0).unwrap();
        assert!(markup.get_attr("class").is_some_and(|c| c.contains("md-h1")));
        assert_eq!(ed.cursor(), CursorState::caret(0, 7));
    }

    #[test]
    fn test_input_splits_host_newlines() {
        let mut ed = editor("ab");
        ed.set_caret_offset(0, 1);
        ed.surface_mut().type_text("\n");
        ed.input();
        assert_eq!(ed.markdown(), "a\nb");
        assert_eq!(ed.cursor(), CursorState::caret(1, 0));
    }

    #[test]
    fn test_composition_defers_render_then_saves() {
        let mut ed = editor("x");
        ed.set_caret_offset(0, 1);
        ed.composition_start();
        ed.surface_mut().type_text("**");
        ed.input();
        assert_eq!(ed.markdown(), "x**");
        assert_eq!(ed.history().len(), 1);
        ed.composition_end();
        assert_eq!(ed.history().len(), 2);
        assert_eq!(ed.surface().line_text(0).as_deref(), Some("x**"));
    }
}

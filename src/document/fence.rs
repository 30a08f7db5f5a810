//! Code-fence state machine.
//!
//! Every edit triggers a full top-to-bottom pass. Documents are sized for
//! an editing session, so the O(lines) scan stays cheap; a local rescan
//! would have to reproduce exactly this classification.

use super::block::{classify_block, fence_marker};
use super::types::{Line, LineKind};

/// Classification state carried across line boundaries.
#[derive(Debug, Default)]
struct FenceState {
    in_fence: bool,
}

impl FenceState {
    fn classify(&mut self, raw: &str) -> LineKind {
        match fence_marker(raw) {
            Some(lang) if !self.in_fence => {
                self.in_fence = true;
                LineKind::FenceStart {
                    lang: lang.to_string(),
                }
            }
            Some(_) => {
                self.in_fence = false;
                LineKind::FenceEnd
            }
            None if self.in_fence => LineKind::FenceContent,
            None => classify_block(raw),
        }
    }
}

/// Re-derive the kind of every line.
///
/// Returns the indices whose kind changed, so callers can re-render only
/// those. An unterminated fence leaves everything below it as content.
pub fn rescan(lines: &mut [Line]) -> Vec<usize> {
    let _scope = crate::perf::scope("fence.rescan");
    let mut state = FenceState::default();
    let mut changed = Vec::new();
    for (index, line) in lines.iter_mut().enumerate() {
        let kind = state.classify(line.raw());
        if &kind != line.kind() {
            line.set_kind(kind);
            changed.push(index);
        }
    }
    tracing::trace!(lines = lines.len(), changed = changed.len(), "fence rescan");
    changed
}

/// Classify raw lines from scratch, without any prior state.
pub fn classify_all<'a>(raws: impl IntoIterator<Item = &'a str>) -> Vec<LineKind> {
    let mut state = FenceState::default();
    raws.into_iter().map(|raw| state.classify(raw)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn kinds(md: &str) -> Vec<LineKind> {
        Document::from_markdown(md)
            .lines()
            .iter()
            .map(|l| l.kind().clone())
            .collect()
    }

    #[test]
    fn test_fence_start_content_end() {
        assert_eq!(
            kinds("```js\nlet x = 1;\n```\nafter"),
            vec![
                LineKind::FenceStart {
                    lang: "js".to_string()
                },
                LineKind::FenceContent,
                LineKind::FenceEnd,
                LineKind::Normal,
            ]
        );
    }

    #[test]
    fn test_block_syntax_inside_fence_is_content() {
        let k = kinds("```\n# h\n> q\n- l\n```");
        assert_eq!(k[1], LineKind::FenceContent);
        assert_eq!(k[2], LineKind::FenceContent);
        assert_eq!(k[3], LineKind::FenceContent);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let k = kinds("text\n```python\na\n\n# b");
        assert_eq!(k[0], LineKind::Normal);
        assert!(k[2..].iter().all(|kind| *kind == LineKind::FenceContent));
    }

    #[test]
    fn test_closing_fence_with_suffix_still_closes() {
        let k = kinds("```\ncode\n```rust\nnormal");
        assert_eq!(k[2], LineKind::FenceEnd);
        assert_eq!(k[3], LineKind::Normal);
    }

    #[test]
    fn test_indented_fence_marker_counts() {
        let k = kinds("  ```\nx\n  ```");
        assert!(matches!(k[0], LineKind::FenceStart { .. }));
        assert_eq!(k[2], LineKind::FenceEnd);
    }

    #[test]
    fn test_removing_opening_fence_restores_normal_lines() {
        let mut doc = Document::from_markdown("```\n# title\n- item");
        let changed = doc.set_raw(0, "plain");
        assert_eq!(changed, vec![1, 2, 0]);
        assert_eq!(doc.line(1).unwrap().kind(), &LineKind::Heading(1));
        assert!(matches!(
            doc.line(2).unwrap().kind(),
            LineKind::ListItem { .. }
        ));
    }

    #[test]
    fn test_rescan_of_consistent_document_changes_nothing() {
        let mut doc = Document::from_markdown("```\na\n```\nb");
        assert!(doc.rescan().is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn line_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("```".to_string()),
                Just("```rust".to_string()),
                Just("# heading".to_string()),
                Just("- item".to_string()),
                Just(String::new()),
                "[a-z ]{0,8}",
            ]
        }

        proptest! {
            #[test]
            fn single_edit_matches_full_rescan(
                lines in prop::collection::vec(line_strategy(), 1..20),
                index in 0usize..20,
                replacement in line_strategy(),
            ) {
                let mut doc = Document::from_markdown(&lines.join("\n"));
                let index = index % doc.line_count();
                doc.set_raw(index, replacement);

                let fresh = Document::from_markdown(&doc.markdown());
                let incremental: Vec<LineKind> =
                    doc.lines().iter().map(|l| l.kind().clone()).collect();
                prop_assert_eq!(&incremental, &classify_all(fresh.markdown().split('\n')));
                let fresh_kinds: Vec<LineKind> =
                    fresh.lines().iter().map(|l| l.kind().clone()).collect();
                prop_assert_eq!(incremental, fresh_kinds);
            }
        }
    }
}

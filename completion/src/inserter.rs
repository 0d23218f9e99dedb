use crate::Completion;
use crate::CompletionRequest;
use std::sync::Arc;
use tracing::debug;

/// Completion-source collaborator, queried synchronously at trigger time.
/// An empty result suppresses the popup.
pub trait CompletionProvider: Send + Sync + 'static {
    fn completions(&self, query_prefix: &str) -> Vec<Completion>;
}

/// Anchors completion requests to a text offset at popup-trigger time and
/// computes the splice to apply on acceptance.
///
/// Stateless per request: the only retained state is the active
/// [`CompletionRequest`], and every path out (accept, dismiss, supersede,
/// empty result) drops it.
pub struct CompletionInserter {
    provider: Arc<dyn CompletionProvider>,
    active: Option<CompletionRequest>,
}

impl CompletionInserter {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            active: None,
        }
    }

    /// Handles the completion trigger key.
    ///
    /// Records `anchor` (a character offset into the surface text) as of the
    /// trigger and queries the provider. An empty result means no popup:
    /// nothing is retained and `None` is returned. A non-empty result
    /// retains the new request, superseding any previous one, and returns it
    /// for the popup to display.
    pub fn on_trigger_requested(
        &mut self,
        query_prefix: &str,
        anchor: usize,
    ) -> Option<&CompletionRequest> {
        self.active = None;
        let candidates = self.provider.completions(query_prefix);
        if candidates.is_empty() {
            return None;
        }
        self.active = Some(CompletionRequest {
            query_prefix: query_prefix.to_string(),
            anchor,
            candidates,
        });
        self.active.as_ref()
    }

    /// Resolves the active request with the candidate the user picked.
    ///
    /// The returned splice replaces the `selected.chars_to_remove`
    /// characters immediately preceding the trigger-time anchor with
    /// `selected.insert_text`; it is computed from the anchor alone, so
    /// cursor moves between trigger and acceptance do not shift it. Returns
    /// `None` when no request is active (e.g. the popup was already
    /// dismissed).
    pub fn on_accept(&mut self, selected: &Completion) -> Option<TextSplice> {
        let request = self.active.take()?;
        Some(TextSplice {
            start: request.anchor.saturating_sub(selected.chars_to_remove),
            end: request.anchor,
            insert: selected.insert_text.clone(),
        })
    }

    /// Drops the active request (popup closed without acceptance).
    pub fn dismiss(&mut self) {
        self.active = None;
    }

    pub fn active_request(&self) -> Option<&CompletionRequest> {
        self.active.as_ref()
    }
}

/// Replacement of the character span `[start, end)` with `insert`, to be
/// applied by the surface to its current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSplice {
    pub start: usize,
    pub end: usize,
    pub insert: String,
}

impl TextSplice {
    /// Applies the splice to `text`: `text[..start] + insert + text[end..]`
    /// in character offsets.
    ///
    /// Offsets that fall outside `text` (the surface was edited concurrently
    /// with the popup) are clamped to the available range, degrading to a
    /// smaller replacement or a pure insertion; surrounding text is never
    /// touched.
    pub fn apply(&self, text: &str) -> String {
        let char_count = text.chars().count();
        let end = self.end.min(char_count);
        let start = self.start.min(end);
        if start != self.start || end != self.end {
            debug!(
                start = self.start,
                end = self.end,
                char_count,
                "splice clamped to current text"
            );
        }

        let start_byte = char_to_byte_offset(text, start);
        let end_byte = char_to_byte_offset(text, end);
        let mut result = String::with_capacity(text.len() + self.insert.len());
        result.push_str(&text[..start_byte]);
        result.push_str(&self.insert);
        result.push_str(&text[end_byte..]);
        result
    }
}

/// Byte index of the `char_offset`-th character of `text`, saturating to the
/// end of the string.
pub(crate) fn char_to_byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    /// Provider that completes any non-empty prefix with a fixed candidate
    /// list derived from the prefix, and nothing for prefixes it was told to
    /// reject.
    struct FixedProvider {
        candidates: Vec<Completion>,
    }

    impl CompletionProvider for FixedProvider {
        fn completions(&self, query_prefix: &str) -> Vec<Completion> {
            if query_prefix.is_empty() {
                Vec::new()
            } else {
                self.candidates.clone()
            }
        }
    }

    fn candidate(insert_text: &str, chars_to_remove: usize) -> Completion {
        Completion {
            label: insert_text.to_string(),
            insert_text: insert_text.to_string(),
            chars_to_remove,
        }
    }

    fn inserter_with(candidates: Vec<Completion>) -> CompletionInserter {
        CompletionInserter::new(Arc::new(FixedProvider { candidates }))
    }

    #[test]
    fn pure_insertion_at_the_anchor() {
        let selected = candidate("completion", 0);
        let mut inserter = inserter_with(vec![selected.clone()]);

        inserter.on_trigger_requested("simple.", 7).unwrap();
        let splice = inserter.on_accept(&selected).unwrap();

        assert_eq!(splice.apply("simple."), "simple.completion");
    }

    #[test]
    fn replacing_the_whole_typed_prefix() {
        let selected = candidate("not.so.simple.completion", 7);
        let mut inserter = inserter_with(vec![selected.clone()]);

        inserter.on_trigger_requested("simple.", 7).unwrap();
        let splice = inserter.on_accept(&selected).unwrap();

        assert_eq!(splice.apply("simple."), "not.so.simple.completion");
    }

    #[test]
    fn replacement_in_the_middle_of_surrounding_text() {
        let selected = candidate("is.ok", "both.sides.of".len());
        let mut inserter = inserter_with(vec![selected.clone()]);

        // Caret after "of": the 13 chars of "both.sides.of" ending at the
        // anchor are replaced, the rest of the line is untouched.
        inserter.on_trigger_requested("check.both.sides.of", 21).unwrap();
        let splice = inserter.on_accept(&selected).unwrap();

        assert_eq!(splice.apply("( check.both.sides.of )"), "( check.is.ok )");
    }

    #[test]
    fn splice_is_unaffected_by_cursor_motion_before_acceptance() {
        // The popup was triggered with the caret after "some initial"; the
        // user then moves the caret somewhere else before picking a
        // candidate. Nothing here consults a cursor, so every acceptance
        // produces the same result.
        let selected = candidate("expected", "initial".len());
        for _cursor_at_acceptance in [0, "some".len(), "some initial text".len()] {
            let mut inserter = inserter_with(vec![selected.clone()]);
            inserter
                .on_trigger_requested("some initial", "some initial".len())
                .unwrap();
            let splice = inserter.on_accept(&selected).unwrap();
            assert_eq!(splice.apply("some initial text"), "some expected text");
        }
    }

    #[test]
    fn empty_provider_result_suppresses_the_popup() {
        let mut inserter = inserter_with(vec![candidate("x", 0)]);

        assert!(inserter.on_trigger_requested("", 0).is_none());
        assert!(inserter.active_request().is_none());
    }

    #[test]
    fn empty_result_drops_a_previous_request() {
        let mut inserter = inserter_with(vec![candidate("x", 0)]);

        inserter.on_trigger_requested("a", 1).unwrap();
        assert!(inserter.on_trigger_requested("", 0).is_none());
        assert!(inserter.active_request().is_none());
    }

    #[test]
    fn new_trigger_supersedes_the_previous_request() {
        let selected = candidate("value", 0);
        let mut inserter = inserter_with(vec![selected.clone()]);

        inserter.on_trigger_requested("first", 5).unwrap();
        inserter.on_trigger_requested("second", 9).unwrap();

        assert_eq!(inserter.active_request().unwrap().anchor, 9);
        let splice = inserter.on_accept(&selected).unwrap();
        assert_eq!(splice.end, 9);
    }

    #[test]
    fn accept_without_an_active_request_is_a_no_op() {
        let selected = candidate("x", 0);
        let mut inserter = inserter_with(vec![selected.clone()]);

        assert!(inserter.on_accept(&selected).is_none());

        inserter.on_trigger_requested("a", 1).unwrap();
        inserter.dismiss();
        assert!(inserter.on_accept(&selected).is_none());
    }

    #[test]
    fn accept_consumes_the_request() {
        let selected = candidate("x", 0);
        let mut inserter = inserter_with(vec![selected.clone()]);

        inserter.on_trigger_requested("a", 1).unwrap();
        assert!(inserter.on_accept(&selected).is_some());
        assert!(inserter.active_request().is_none());
        assert!(inserter.on_accept(&selected).is_none());
    }

    #[test]
    fn oversized_chars_to_remove_clamps_to_the_start_of_text() {
        let splice = TextSplice {
            start: 0, // anchor 3 with chars_to_remove 10 saturates to 0
            end: 3,
            insert: "new".to_string(),
        };
        assert_eq!(splice.apply("old tail"), "new tail");
    }

    #[test]
    fn anchor_beyond_current_text_clamps_to_the_end() {
        // The surface shrank between trigger and acceptance.
        let splice = TextSplice {
            start: 8,
            end: 20,
            insert: "!".to_string(),
        };
        assert_eq!(splice.apply("short"), "short!");
    }

    #[test]
    fn splice_offsets_are_character_offsets() {
        let splice = TextSplice {
            start: 2,
            end: 4,
            insert: "ça".to_string(),
        };
        // "héllö" chars: h é l l ö
        assert_eq!(splice.apply("héllö"), "héçaö");
    }
}

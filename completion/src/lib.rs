//! Completion insertion for the interpreter console's input field.
//!
//! A completion popup is anchored to the text offset captured when it was
//! triggered, not to wherever the cursor happens to be when a candidate is
//! accepted: [`CompletionInserter`] records that anchor, queries the
//! [`CompletionProvider`] collaborator, and on acceptance produces the
//! [`TextSplice`] the surface applies to its current content. Everything
//! operates on opaque strings and character offsets; no tokenizer for any
//! particular language lives here.

mod inserter;
mod types;

pub use inserter::CompletionInserter;
pub use inserter::CompletionProvider;
pub use inserter::TextSplice;
pub use types::Completion;
pub use types::CompletionRequest;

/// The surface text up to a character offset, for hosts that derive the
/// completion query from their current content. The offset saturates to the
/// end of `text`.
pub fn prefix_before_anchor(text: &str, anchor: usize) -> &str {
    &text[..inserter::char_to_byte_offset(text, anchor)]
}

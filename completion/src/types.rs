use serde::Deserialize;
use serde::Serialize;

/// A single completion candidate offered by the popup.
///
/// * `label` – Text shown in the popup list.
/// * `insert_text` – Text spliced into the surface on acceptance.
/// * `chars_to_remove` – Number of characters immediately preceding the
///   anchor to delete before inserting; `0` means pure insertion, and a
///   value covering the whole typed prefix replaces the prefix token (e.g. a
///   dotted path).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    pub insert_text: String,
    pub chars_to_remove: usize,
}

/// One popup's worth of completion state, created at trigger time.
///
/// `anchor` is the character offset captured when the popup opened and is
/// never re-read: cursor motion between trigger and acceptance must not move
/// the replacement span. A request lives until it is accepted, dismissed, or
/// superseded by a new trigger.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CompletionRequest {
    pub query_prefix: String,
    pub anchor: usize,
    /// Ordered as the completion source returned them; never empty.
    pub candidates: Vec<Completion>,
}

//! Reduces a chapter's raw item list to the items the alignment
//! interpreter acts on.

use crate::types::{Item, ItemSubType, LexicalField};

/// Alignment milestone tag. Matched exactly, never as a substring.
pub const MILESTONE_TAG: &str = "milestone/zaln";
/// Substring present in both verse start and verse end payloads.
pub const VERSE_MARKER: &str = "verse/";

pub const STRONG_MARKER: &str = "x-strong";
pub const LEMMA_MARKER: &str = "x-lemma";
pub const CONTENT_MARKER: &str = "x-content";

pub fn is_milestone(item: &Item) -> bool {
    item.payload == MILESTONE_TAG
}

pub fn is_verse_boundary(item: &Item) -> bool {
    item.payload.contains(VERSE_MARKER)
}

/// Which lexical attribute an attribute-start payload carries, if any.
///
/// Checked in the order strong, lemma, content.
pub fn lexical_attribute(payload: &str) -> Option<LexicalField> {
    if payload.contains(STRONG_MARKER) {
        Some(LexicalField::Strong)
    } else if payload.contains(LEMMA_MARKER) {
        Some(LexicalField::Lemma)
    } else if payload.contains(CONTENT_MARKER) {
        Some(LexicalField::Content)
    } else {
        None
    }
}

pub fn is_alignment_relevant(item: &Item) -> bool {
    is_milestone(item)
        || item.sub_type == ItemSubType::WordLike
        || item.sub_type == ItemSubType::Punctuation
        || (item.sub_type == ItemSubType::Start && lexical_attribute(&item.payload).is_some())
        || is_verse_boundary(item)
}

/// Keeps relevant items in stream order. No reordering, no dedup.
pub fn filter_items(items: &[Item]) -> Vec<Item> {
    items.iter()
        .filter(|item| is_alignment_relevant(item))
        .cloned()
        .collect()
}

//! The alignment stream interpreter.
//!
//! A chapter's filtered item stream is folded over an [`AlignmentState`]. The
//! state counts open alignment milestones, accumulates the pending word with
//! its lexical entries and punctuation, and commits a word whenever the depth
//! is back at zero. Verse ends commit the verse's word list.
//!
//! How a strong attribute becomes a [`GreekAlignmentEntry`] is decided by a
//! [`LexicalStrategy`], selectable per corpus.

use std::fmt;
use std::mem;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::item_filter::{filter_items, is_milestone, is_verse_boundary, lexical_attribute};
use crate::lexicon::{IdentifierWidth, LexicalError, LexicalResolver, normalize_identifier};
use crate::logger;
use crate::types::{AlignedVerse, AlignedWord, ChapterOutput, GreekAlignmentEntry, Item, ItemSubType, LexicalField};

lazy_static! {
    /// Value carried after the last '/' of an attribute payload
    static ref MARKUP_VALUE_REGEX: Regex = Regex::new(r"[^/]+$").unwrap();
}

pub fn markup_value(payload: &str) -> Option<&str> {
    MARKUP_VALUE_REGEX.find(payload).map(|m| m.as_str())
}

/// Turns lexical attributes into alignment entries.
pub trait LexicalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Opens a new entry for a strong attribute payload.
    fn open_entry(&self, payload: &str) -> Result<GreekAlignmentEntry, LexicalError>;

    /// Applies a lemma or content value from the markup to the last open entry.
    fn apply_markup_value(&self, entry: &mut GreekAlignmentEntry, field: LexicalField, value: &str) {
        match field {
            LexicalField::Lemma => entry.lemma = Some(value.to_string()),
            LexicalField::Content => entry.content = Some(value.to_string()),
            LexicalField::Strong => {}
        }
    }
}

/// Takes the identifier, lemma and content straight from the markup attributes.
#[derive(Debug, Clone)]
pub struct DirectExtraction {
    pub width: IdentifierWidth,
}

impl DirectExtraction {
    pub fn new(width: IdentifierWidth) -> Self {
        DirectExtraction { width }
    }
}

impl Default for DirectExtraction {
    fn default() -> Self {
        DirectExtraction::new(IdentifierWidth::Five)
    }
}

impl LexicalStrategy for DirectExtraction {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn open_entry(&self, payload: &str) -> Result<GreekAlignmentEntry, LexicalError> {
        normalize_identifier(payload, self.width).map(GreekAlignmentEntry::new)
    }
}

/// Resolves the headword (and gloss) of each identifier through the lexical store.
///
/// Markup lemma/content values only fill fields the store left empty.
pub struct LexicalStoreResolution {
    resolver: LexicalResolver,
    fallback_to_markup_lemma: bool,
}

impl LexicalStoreResolution {
    pub fn new(resolver: LexicalResolver, fallback_to_markup_lemma: bool) -> Self {
        LexicalStoreResolution {
            resolver,
            fallback_to_markup_lemma,
        }
    }
}

impl LexicalStrategy for LexicalStoreResolution {
    fn name(&self) -> &'static str {
        "lexical-store"
    }

    fn open_entry(&self, payload: &str) -> Result<GreekAlignmentEntry, LexicalError> {
        let identifier = self.resolver.normalize(payload)?;

        match self.resolver.resolve_identifier(&identifier) {
            Ok(resolved) => {
                let mut entry = GreekAlignmentEntry::new(resolved.identifier).with_lemma(resolved.headword);
                entry.content = resolved.content;
                Ok(entry)
            }
            Err(e) if self.fallback_to_markup_lemma => {
                logger::warn(&format!("{}, falling back to markup lemma", e));
                Ok(GreekAlignmentEntry::new(identifier))
            }
            Err(e) => Err(e),
        }
    }

    fn apply_markup_value(&self, entry: &mut GreekAlignmentEntry, field: LexicalField, value: &str) {
        match field {
            LexicalField::Lemma => {
                entry.lemma.get_or_insert_with(|| value.to_string());
            }
            LexicalField::Content => {
                entry.content.get_or_insert_with(|| value.to_string());
            }
            LexicalField::Strong => {}
        }
    }
}

/// Anomalies noticed while assembling a chapter.
///
/// These never change the output: unterminated verses are still dropped and
/// values after an unresolved identifier still land on the previous entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AlignmentWarning {
    UnresolvedIdentifier { verse: u32, payload: String, reason: String },
    OrphanAttribute { verse: u32, field: LexicalField, value: String },
    EmptyAttributeValue { verse: u32, payload: String },
    PossibleMisattachment { verse: u32, field: LexicalField, target_strong: String },
    VerseBoundaryInsideMilestone { verse: u32, depth: u32, pending_text: String },
    UnbalancedMilestoneEnd { verse: u32 },
    UnterminatedVerse { verse: u32, words: usize },
    PendingWordAtEnd { text: String },
    UnclosedMilestones { depth: u32 },
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentWarning::UnresolvedIdentifier { verse, payload, reason } => {
                write!(f, "verse {}: unresolved identifier in '{}': {}", verse, payload, reason)
            }
            AlignmentWarning::OrphanAttribute { verse, field, value } => {
                write!(f, "verse {}: {} '{}' has no entry to attach to, dropped", verse, field, value)
            }
            AlignmentWarning::EmptyAttributeValue { verse, payload } => {
                write!(f, "verse {}: attribute without value: '{}'", verse, payload)
            }
            AlignmentWarning::PossibleMisattachment { verse, field, target_strong } => {
                write!(f, "verse {}: {} attached to {} after an unresolved identifier", verse, field, target_strong)
            }
            AlignmentWarning::VerseBoundaryInsideMilestone { verse, depth, pending_text } => {
                write!(f, "verse {}: verse ended at depth {} with pending text '{}'", verse, depth, pending_text)
            }
            AlignmentWarning::UnbalancedMilestoneEnd { verse } => {
                write!(f, "verse {}: milestone end without a matching start", verse)
            }
            AlignmentWarning::UnterminatedVerse { verse, words } => {
                write!(f, "verse {}: no verse end before end of chapter, {} words dropped", verse, words)
            }
            AlignmentWarning::PendingWordAtEnd { text } => {
                write!(f, "pending word at end of chapter: '{}'", text)
            }
            AlignmentWarning::UnclosedMilestones { depth } => {
                write!(f, "{} milestones still open at end of chapter", depth)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterAlignment {
    pub verses: ChapterOutput,
    pub warnings: Vec<AlignmentWarning>,
}

/// Accumulator for one chapter's fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentState {
    pub depth: u32,
    pub word: String,
    pub entries: Vec<GreekAlignmentEntry>,
    pub punctuation: Vec<String>,
    pub verse_words: Vec<AlignedWord>,
    pub verse_num: u32,
    pub verses: ChapterOutput,
    pub warnings: Vec<AlignmentWarning>,
    last_identifier_unresolved: bool,
}

impl Default for AlignmentState {
    fn default() -> Self {
        AlignmentState {
            depth: 0,
            word: String::new(),
            entries: Vec::new(),
            punctuation: Vec::new(),
            verse_words: Vec::new(),
            verse_num: 1,
            verses: Vec::new(),
            warnings: Vec::new(),
            last_identifier_unresolved: false,
        }
    }
}

impl AlignmentState {
    pub fn new() -> Self {
        AlignmentState::default()
    }

    /// Applies one item, then the commit rule.
    pub fn step(mut self, item: &Item, strategy: &dyn LexicalStrategy) -> Self {
        self.apply(item, strategy);
        self.commit_word_if_ready();
        self
    }

    fn apply(&mut self, item: &Item, strategy: &dyn LexicalStrategy) {
        if is_milestone(item) {
            match item.sub_type {
                ItemSubType::Start => self.depth += 1,
                ItemSubType::End => {
                    if self.depth == 0 {
                        self.warnings.push(AlignmentWarning::UnbalancedMilestoneEnd { verse: self.verse_num });
                    } else {
                        self.depth -= 1;
                    }
                }
                _ => {}
            }
            return;
        }

        match item.sub_type {
            ItemSubType::WordLike => self.push_word(&item.payload),
            ItemSubType::Punctuation => self.push_punctuation(&item.payload),
            ItemSubType::Start => {
                if let Some(field) = lexical_attribute(&item.payload) {
                    self.apply_attribute(field, &item.payload, strategy);
                }
            }
            ItemSubType::End => {
                if is_verse_boundary(item) {
                    self.commit_verse();
                }
            }
            _ => {}
        }
    }

    fn push_word(&mut self, text: &str) {
        if !self.word.is_empty() {
            self.word.push(' ');
        }
        self.word.push_str(text);
    }

    fn push_punctuation(&mut self, mark: &str) {
        if self.word.is_empty() {
            if let Some(last) = self.verse_words.last_mut() {
                last.punctuation_data
                    .get_or_insert_with(Vec::new)
                    .push(mark.to_string());
                return;
            }
        }
        self.punctuation.push(mark.to_string());
    }

    fn apply_attribute(&mut self, field: LexicalField, payload: &str, strategy: &dyn LexicalStrategy) {
        if field == LexicalField::Strong {
            match strategy.open_entry(payload) {
                Ok(entry) => {
                    self.entries.push(entry);
                    self.last_identifier_unresolved = false;
                }
                Err(e) => {
                    self.warnings.push(AlignmentWarning::UnresolvedIdentifier {
                        verse: self.verse_num,
                        payload: payload.to_string(),
                        reason: e.to_string(),
                    });
                    self.last_identifier_unresolved = true;
                }
            }
            return;
        }

        let value = match markup_value(payload) {
            Some(v) => v,
            None => {
                self.warnings.push(AlignmentWarning::EmptyAttributeValue {
                    verse: self.verse_num,
                    payload: payload.to_string(),
                });
                return;
            }
        };

        match self.entries.last_mut() {
            Some(entry) => {
                if self.last_identifier_unresolved {
                    self.warnings.push(AlignmentWarning::PossibleMisattachment {
                        verse: self.verse_num,
                        field,
                        target_strong: entry.strong.clone(),
                    });
                }
                strategy.apply_markup_value(entry, field, value);
            }
            None => {
                self.warnings.push(AlignmentWarning::OrphanAttribute {
                    verse: self.verse_num,
                    field,
                    value: value.to_string(),
                });
            }
        }
    }

    fn commit_word_if_ready(&mut self) {
        if self.depth != 0 || self.word.is_empty() {
            return;
        }

        let entries = mem::take(&mut self.entries);
        let punctuation = mem::take(&mut self.punctuation);

        self.verse_words.push(AlignedWord {
            text: mem::take(&mut self.word),
            greek_alignment_data: if entries.is_empty() { None } else { Some(entries) },
            punctuation_data: if punctuation.is_empty() { None } else { Some(punctuation) },
        });
        self.last_identifier_unresolved = false;
    }

    fn commit_verse(&mut self) {
        if self.depth != 0 || !self.word.is_empty() {
            self.warnings.push(AlignmentWarning::VerseBoundaryInsideMilestone {
                verse: self.verse_num,
                depth: self.depth,
                pending_text: self.word.clone(),
            });
        }

        self.verses.push(AlignedVerse {
            verse_num: self.verse_num,
            aligned_verse_text: mem::take(&mut self.verse_words),
        });
        self.verse_num += 1;
    }

    /// Ends the chapter. Anything after the last verse end is dropped.
    pub fn finish(mut self) -> ChapterAlignment {
        if !self.verse_words.is_empty() {
            self.warnings.push(AlignmentWarning::UnterminatedVerse {
                verse: self.verse_num,
                words: self.verse_words.len(),
            });
        }
        if !self.word.is_empty() {
            self.warnings.push(AlignmentWarning::PendingWordAtEnd { text: self.word.clone() });
        }
        if self.depth != 0 {
            self.warnings.push(AlignmentWarning::UnclosedMilestones { depth: self.depth });
        }

        ChapterAlignment {
            verses: self.verses,
            warnings: self.warnings,
        }
    }
}

/// Folds an already filtered item stream into verses.
pub fn assemble(items: &[Item], strategy: &dyn LexicalStrategy) -> ChapterAlignment {
    items.iter()
        .fold(AlignmentState::new(), |state, item| state.step(item, strategy))
        .finish()
}

/// Filters a raw chapter item list, then assembles it.
pub fn align_chapter(raw_items: &[Item], strategy: &dyn LexicalStrategy) -> ChapterAlignment {
    assemble(&filter_items(raw_items), strategy)
}

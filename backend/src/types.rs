use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Classification of an item produced by the markup query engine.
///
/// Serialized names follow the engine's `subType` values. Anything the
/// pipeline doesn't act on (`eol`, graft markers, ...) becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemSubType {
    Start,
    End,
    WordLike,
    Punctuation,
    LineSpace,
    #[serde(other)]
    Other,
}

/// One entry of the flat, already tokenized markup stream for a chapter.
///
/// `payload` is overloaded: for scope items it is the tag path
/// (`milestone/zaln`, `verse/3`), for attribute starts it also carries the
/// value after the last `/`, for tokens it is the token text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "subType")]
    pub sub_type: ItemSubType,
    pub payload: String,
}

impl Item {
    pub fn new(sub_type: ItemSubType, payload: impl Into<String>) -> Self {
        Item {
            sub_type,
            payload: payload.into(),
        }
    }

    pub fn start(payload: impl Into<String>) -> Self {
        Item::new(ItemSubType::Start, payload)
    }

    pub fn end(payload: impl Into<String>) -> Self {
        Item::new(ItemSubType::End, payload)
    }

    pub fn word(text: impl Into<String>) -> Self {
        Item::new(ItemSubType::WordLike, text)
    }

    pub fn punctuation(text: impl Into<String>) -> Self {
        Item::new(ItemSubType::Punctuation, text)
    }

    pub fn line_space() -> Self {
        Item::new(ItemSubType::LineSpace, " ")
    }
}

/// The three lexical attributes a source-language alignment can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LexicalField {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "lemma")]
    Lemma,
    #[serde(rename = "content")]
    Content,
}

impl LexicalField {
    pub const ALL: [LexicalField; 3] = [LexicalField::Strong, LexicalField::Lemma, LexicalField::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            LexicalField::Strong => "strong",
            LexicalField::Lemma => "lemma",
            LexicalField::Content => "content",
        }
    }
}

impl fmt::Display for LexicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid LexicalField value: {0}")]
pub struct ParseLexicalFieldError(String);

impl FromStr for LexicalField {
    type Err = ParseLexicalFieldError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "strong" => Ok(LexicalField::Strong),
            "lemma" => Ok(LexicalField::Lemma),
            "content" => Ok(LexicalField::Content),
            _ => Err(ParseLexicalFieldError(s.to_string())),
        }
    }
}

/// One source-language word aligned to a translated word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreekAlignmentEntry {
    pub strong: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl GreekAlignmentEntry {
    pub fn new(strong: impl Into<String>) -> Self {
        GreekAlignmentEntry {
            strong: strong.into(),
            lemma: None,
            content: None,
        }
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn field(&self, field: LexicalField) -> Option<&str> {
        match field {
            LexicalField::Strong => Some(self.strong.as_str()),
            LexicalField::Lemma => self.lemma.as_deref(),
            LexicalField::Content => self.content.as_deref(),
        }
    }
}

/// A translated word (or run of words inside one alignment milestone).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedWord {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greek_alignment_data: Option<Vec<GreekAlignmentEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punctuation_data: Option<Vec<String>>,
}

impl AlignedWord {
    pub fn new(text: impl Into<String>) -> Self {
        AlignedWord {
            text: text.into(),
            greek_alignment_data: None,
            punctuation_data: None,
        }
    }

    pub fn entries(&self) -> &[GreekAlignmentEntry] {
        self.greek_alignment_data.as_deref().unwrap_or(&[])
    }

    pub fn punctuation(&self) -> &[String] {
        self.punctuation_data.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedVerse {
    pub verse_num: u32,
    pub aligned_verse_text: Vec<AlignedWord>,
}

/// All committed verses of one (corpus, book, chapter), in document order.
pub type ChapterOutput = Vec<AlignedVerse>;

/// One document of a corpus as listed by the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    pub document_id: String,
    pub book_code: String,
    pub chapter_count: u32,
}

/// A verse row as it is persisted in the `verses` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRow {
    pub language_code: String,
    pub version: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub verse_text: String,
    pub interleaved_with_strong: String,
    pub interleaved_with_lemma: String,
    pub interleaved_with_content: String,
    pub sort: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    SortKey(#[from] crate::book_sort::SortKeyError),
}

impl PersistedRow {
    /// Checks that no field is empty. Rows failing this are dropped, not inserted.
    pub fn check_required(&self) -> Result<(), RowError> {
        let text_fields = [
            ("language_code", &self.language_code),
            ("version", &self.version),
            ("book", &self.book),
            ("verse_text", &self.verse_text),
            ("interleaved_with_strong", &self.interleaved_with_strong),
            ("interleaved_with_lemma", &self.interleaved_with_lemma),
            ("interleaved_with_content", &self.interleaved_with_content),
        ];

        for (name, value) in text_fields {
            if value.trim().is_empty() {
                return Err(RowError::MissingField(name));
            }
        }

        if self.chapter == 0 {
            return Err(RowError::MissingField("chapter"));
        }
        if self.verse == 0 {
            return Err(RowError::MissingField("verse"));
        }

        Ok(())
    }
}

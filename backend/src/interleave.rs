//! Flattens an aligned verse into the plain and interleaved text columns.

use crate::types::{AlignedVerse, AlignedWord, LexicalField};

/// The four text projections of one verse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterleavedVerse {
    pub plain_text: String,
    pub with_strong: String,
    pub with_lemma: String,
    pub with_content: String,
}

impl InterleavedVerse {
    pub fn field(&self, field: LexicalField) -> &str {
        match field {
            LexicalField::Strong => &self.with_strong,
            LexicalField::Lemma => &self.with_lemma,
            LexicalField::Content => &self.with_content,
        }
    }
}

fn punctuation_text(word: &AlignedWord) -> String {
    word.punctuation().join(" ")
}

fn join_parts(parts: &[&str]) -> String {
    parts.iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Word text followed by its trailing punctuation.
pub fn render_plain_word(word: &AlignedWord) -> String {
    let punctuation = punctuation_text(word);
    join_parts(&[&word.text, &punctuation])
}

/// Word text, then the field's value from every entry, then the punctuation.
///
/// Entries without the field contribute an empty value, so the value list can
/// carry doubled spaces, even when no entry has the field.
pub fn render_interleaved_word(word: &AlignedWord, field: LexicalField) -> String {
    let data = word.entries()
        .iter()
        .map(|entry| entry.field(field).unwrap_or(""))
        .collect::<Vec<&str>>()
        .join(" ");
    let punctuation = punctuation_text(word);

    join_parts(&[&word.text, &data, &punctuation])
}

pub fn interleave_words<F>(words: &[AlignedWord], render: F) -> String
where
    F: Fn(&AlignedWord) -> String,
{
    words.iter()
        .map(render)
        .filter(|s| !s.is_empty())
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn interleave_verse(verse: &AlignedVerse) -> InterleavedVerse {
    let words = &verse.aligned_verse_text;
    InterleavedVerse {
        plain_text: interleave_words(words, render_plain_word),
        with_strong: interleave_words(words, |w| render_interleaved_word(w, LexicalField::Strong)),
        with_lemma: interleave_words(words, |w| render_interleaved_word(w, LexicalField::Lemma)),
        with_content: interleave_words(words, |w| render_interleaved_word(w, LexicalField::Content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GreekAlignmentEntry;

    fn word(text: &str, entries: Vec<GreekAlignmentEntry>, punctuation: &[&str]) -> AlignedWord {
        AlignedWord {
            text: text.to_string(),
            greek_alignment_data: if entries.is_empty() { None } else { Some(entries) },
            punctuation_data: if punctuation.is_empty() {
                None
            } else {
                Some(punctuation.iter().map(|p| p.to_string()).collect())
            },
        }
    }

    #[test]
    fn test_interleave_verse() {
        let verse = AlignedVerse {
            verse_num: 1,
            aligned_verse_text: vec![
                word("In the beginning", vec![GreekAlignmentEntry::new("g0746").with_lemma("ἀρχή").with_content("ἀρχῇ")], &[]),
                word("was", vec![GreekAlignmentEntry::new("g1510").with_lemma("εἰμί")], &[]),
                word("the Word", vec![GreekAlignmentEntry::new("g3056").with_lemma("λόγος")], &[","]),
            ],
        };

        let text = interleave_verse(&verse);
        assert_eq!(text.plain_text, "In the beginning was the Word ,");
        assert_eq!(text.with_strong, "In the beginning g0746 was g1510 the Word g3056 ,");
        assert_eq!(text.with_lemma, "In the beginning ἀρχή was εἰμί the Word λόγος ,");
        assert_eq!(text.with_content, "In the beginning ἀρχῇ was the Word ,");
        assert_eq!(text.field(LexicalField::Lemma), text.with_lemma);
    }

    #[test]
    fn test_word_without_entries_matches_plain_text() {
        let w = word("and", vec![], &[";"]);
        let plain = render_plain_word(&w);
        assert_eq!(plain, "and ;");
        for field in LexicalField::ALL {
            assert_eq!(render_interleaved_word(&w, field), plain);
        }
    }

    #[test]
    fn test_missing_field_keeps_positions() {
        let w = word("God", vec![
            GreekAlignmentEntry::new("g3588"),
            GreekAlignmentEntry::new("g2316").with_lemma("θεός"),
        ], &[]);
        // The first entry has no lemma, its empty slot stays in the list.
        assert_eq!(render_interleaved_word(&w, LexicalField::Lemma), "God  θεός");
        assert_eq!(render_interleaved_word(&w, LexicalField::Strong), "God g3588 g2316");
    }

    #[test]
    fn test_field_absent_from_every_entry_keeps_empty_slots() {
        let w = word("the Word", vec![
            GreekAlignmentEntry::new("g3588"),
            GreekAlignmentEntry::new("g3056"),
        ], &[","]);
        assert_eq!(render_interleaved_word(&w, LexicalField::Content), "the Word   ,");

        let single = word("was", vec![GreekAlignmentEntry::new("g1510")], &[]);
        assert_eq!(render_interleaved_word(&single, LexicalField::Lemma), "was");
    }

    #[test]
    fn test_empty_verse() {
        let verse = AlignedVerse { verse_num: 3, aligned_verse_text: vec![] };
        assert_eq!(interleave_verse(&verse), InterleavedVerse::default());
    }
}

//! Ingest of the source-language corpus the translations are checked against.
//!
//! The source text carries no alignment of its own, so each verse is stored
//! as plain text in all four text columns. Verse numbers come from counting
//! verse ends, the same rule the alignment assembler uses, so both sides
//! produce the same keys.

use anyhow::Result;

use crate::book_sort::{is_known_book, sort_key};
use crate::db::verses::VersesDbHandle;
use crate::item_filter::is_verse_boundary;
use crate::item_source::ItemSource;
use crate::logger;
use crate::populate::{insert_checked_rows, PopulateStats};
use crate::types::{Item, ItemSubType, PersistedRow, RowError};

/// Whitespace-normalised text of each verse of a chapter, numbered by verse-end count.
///
/// Only word-like, punctuation and line-space items inside a verse contribute.
/// Text after the last verse end is dropped.
pub fn verse_texts(items: &[Item]) -> Vec<(u32, String)> {
    let mut verses = Vec::new();
    let mut in_verse = false;
    let mut verse_num = 1;
    let mut buffer = String::new();

    for item in items {
        match item.sub_type {
            ItemSubType::Start if is_verse_boundary(item) => {
                in_verse = true;
            }
            ItemSubType::End if is_verse_boundary(item) => {
                let text = buffer.split_whitespace().collect::<Vec<&str>>().join(" ");
                verses.push((verse_num, text));
                verse_num += 1;
                buffer.clear();
                in_verse = false;
            }
            ItemSubType::WordLike | ItemSubType::Punctuation | ItemSubType::LineSpace if in_verse => {
                buffer.push_str(&item.payload);
            }
            _ => {}
        }
    }

    verses
}

pub fn source_row(language_code: &str, version: &str, book: &str, chapter: u32, verse: u32, text: &str) -> Result<PersistedRow, RowError> {
    let row = PersistedRow {
        language_code: language_code.to_string(),
        version: version.to_string(),
        book: book.to_string(),
        chapter,
        verse,
        verse_text: text.to_string(),
        interleaved_with_strong: text.to_string(),
        interleaved_with_lemma: text.to_string(),
        interleaved_with_content: text.to_string(),
        sort: sort_key(book, chapter, verse)?,
    };
    row.check_required()?;
    Ok(row)
}

/// Inserts every verse of the source corpus.
pub fn ingest_source_corpus(db: &VersesDbHandle, source: &dyn ItemSource, language_code: &str, version: &str) -> Result<PopulateStats> {
    let mut stats = PopulateStats::default();

    let documents = match source.document_index() {
        Ok(d) => d,
        Err(e) => {
            logger::error(&format!("{}_{}: failed to read document index: {}", language_code, version, e));
            return Ok(stats);
        }
    };

    for document in documents {
        if !is_known_book(&document.book_code) {
            logger::warn(&format!("Skipping source document {} with book code {}", document.document_id, document.book_code));
            continue;
        }

        for chapter in 1..=document.chapter_count {
            stats.chapters += 1;

            let items = match source.chapter_items(&document.document_id, chapter) {
                Ok(items) => items,
                Err(e) => {
                    logger::error(&format!("{} {}: query failed: {}", document.book_code, chapter, e));
                    stats.chapters_failed += 1;
                    continue;
                }
            };

            let rows = verse_texts(&items)
                .into_iter()
                .map(|(verse, text)| {
                    source_row(language_code, version, &document.book_code, chapter, verse, &text).map_err(|e| {
                        (format!("{}_{} {} {}:{}", language_code, version, document.book_code, chapter, verse), e)
                    })
                })
                .collect();

            match insert_checked_rows(db, rows) {
                Ok(s) => stats += s,
                Err(e) => {
                    logger::error(&format!("Failed to insert {} {}: {:#}", document.book_code, chapter, e));
                    stats.chapters_failed += 1;
                }
            }
        }
    }

    logger::info(&format!(
        "{}_{}: {} rows inserted, {} dropped, {} duplicates",
        language_code, version, stats.rows_inserted, stats.rows_dropped, stats.duplicates
    ));

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_texts() {
        let items = vec![
            Item::start("chapter/1"),
            Item::word("ΚΕΦ"),
            Item::start("verse/1"),
            Item::word("Ἐν"),
            Item::line_space(),
            Item::word("ἀρχῇ"),
            Item::line_space(),
            Item::word("ἦν"),
            Item::punctuation(","),
            Item::new(ItemSubType::LineSpace, "  \n"),
            Item::end("verse/1"),
            Item::start("verse/2"),
            Item::word("οὗτος"),
            Item::punctuation("."),
            Item::end("verse/2"),
            Item::word("trailing"),
        ];

        assert_eq!(verse_texts(&items), vec![
            (1, "Ἐν ἀρχῇ ἦν,".to_string()),
            (2, "οὗτος.".to_string()),
        ]);
    }

    #[test]
    fn test_source_row_fills_all_text_columns() {
        let row = source_row("koine", "ugnt", "JHN", 1, 1, "Ἐν ἀρχῇ ἦν ὁ λόγος").unwrap();
        assert_eq!(row.interleaved_with_strong, row.verse_text);
        assert_eq!(row.interleaved_with_content, row.verse_text);
        assert_eq!(row.sort, sort_key("JHN", 1, 1).unwrap());

        assert_eq!(source_row("koine", "ugnt", "JHN", 1, 2, ""), Err(RowError::MissingField("verse_text")));
    }
}

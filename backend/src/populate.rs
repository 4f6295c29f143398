//! Loads chapter artifacts into the verses table.

use std::ops::AddAssign;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::artifact::{list_artifacts, read_chapter};
use crate::book_sort::sort_key;
use crate::corpus::discover_corpora;
use crate::db::verses::VersesDbHandle;
use crate::interleave::interleave_verse;
use crate::logger;
use crate::types::{AlignedVerse, PersistedRow, RowError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulateStats {
    pub chapters: usize,
    pub chapters_failed: usize,
    pub rows_inserted: usize,
    pub rows_dropped: usize,
    pub duplicates: usize,
    pub rows_failed: usize,
}

impl AddAssign for PopulateStats {
    fn add_assign(&mut self, other: Self) {
        self.chapters += other.chapters;
        self.chapters_failed += other.chapters_failed;
        self.rows_inserted += other.rows_inserted;
        self.rows_dropped += other.rows_dropped;
        self.duplicates += other.duplicates;
        self.rows_failed += other.rows_failed;
    }
}

/// Projects one aligned verse into a row, with its sort key. Fails if the
/// book is unknown or any required field comes out empty.
pub fn build_row(language_code: &str, version: &str, book: &str, chapter: u32, verse: &AlignedVerse) -> Result<PersistedRow, RowError> {
    let text = interleave_verse(verse);
    let sort = sort_key(book, chapter, verse.verse_num)?;

    let row = PersistedRow {
        language_code: language_code.to_string(),
        version: version.to_string(),
        book: book.to_string(),
        chapter,
        verse: verse.verse_num,
        verse_text: text.plain_text,
        interleaved_with_strong: text.with_strong,
        interleaved_with_lemma: text.with_lemma,
        interleaved_with_content: text.with_content,
        sort,
    };

    row.check_required()?;
    Ok(row)
}

/// Inserts rows that pass the required-field check, counting the rest as dropped.
pub fn insert_checked_rows(db: &VersesDbHandle, rows: Vec<Result<PersistedRow, (String, RowError)>>) -> Result<PopulateStats> {
    let mut stats = PopulateStats::default();
    let mut good = Vec::with_capacity(rows.len());

    for row in rows {
        match row {
            Ok(r) => good.push(r),
            Err((label, e)) => {
                logger::error(&format!("Dropping row {}: {}", label, e));
                stats.rows_dropped += 1;
            }
        }
    }

    let counts = db.insert_rows(&good)?;
    stats.rows_inserted = counts.inserted;
    stats.duplicates = counts.duplicates;
    stats.rows_failed = counts.failed;
    Ok(stats)
}

/// Loads every artifact of one corpus directory.
pub fn populate_corpus(db: &VersesDbHandle, corpus_dir: &Path, language_code: &str, version: &str) -> Result<PopulateStats> {
    let mut stats = PopulateStats::default();

    for artifact in list_artifacts(corpus_dir)? {
        logger::info(&format!("Adding: {}", artifact.path.display()));
        stats.chapters += 1;

        let verses = match read_chapter(&artifact.path) {
            Ok(v) => v,
            Err(e) => {
                logger::error(&format!("{:#}", e));
                stats.chapters_failed += 1;
                continue;
            }
        };

        let rows = verses.iter()
            .map(|verse| {
                build_row(language_code, version, &artifact.book, artifact.chapter, verse).map_err(|e| {
                    (format!("{}_{} {} {}:{}", language_code, version, artifact.book, artifact.chapter, verse.verse_num), e)
                })
            })
            .collect();

        match insert_checked_rows(db, rows) {
            Ok(s) => stats += s,
            Err(e) => {
                logger::error(&format!("Failed to insert {}: {:#}", artifact.path.display(), e));
                stats.chapters_failed += 1;
            }
        }
    }

    Ok(stats)
}

/// Loads every corpus directory under the artifact output directory.
pub fn populate_all(db: &VersesDbHandle, output_dir: &Path) -> Result<PopulateStats> {
    let mut stats = PopulateStats::default();

    for (corpus, dir) in discover_corpora(output_dir)? {
        let corpus_stats = populate_corpus(db, &dir, &corpus.language_code, &corpus.version)?;
        logger::info(&format!(
            "{}: {} rows inserted, {} dropped, {} duplicates",
            corpus, corpus_stats.rows_inserted, corpus_stats.rows_dropped, corpus_stats.duplicates
        ));
        stats += corpus_stats;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book_sort::SortKeyError;
    use crate::types::{AlignedWord, GreekAlignmentEntry};

    fn verse(num: u32, words: Vec<AlignedWord>) -> AlignedVerse {
        AlignedVerse { verse_num: num, aligned_verse_text: words }
    }

    #[test]
    fn test_build_row() {
        let word = AlignedWord {
            text: "Jesus".to_string(),
            greek_alignment_data: Some(vec![GreekAlignmentEntry::new("g2424").with_lemma("Ἰησοῦς")]),
            punctuation_data: None,
        };
        let row = build_row("eng", "ult", "JHN", 11, &verse(35, vec![AlignedWord::new("wept"), word])).unwrap();

        assert_eq!(row.verse_text, "wept Jesus");
        assert_eq!(row.interleaved_with_strong, "wept Jesus g2424");
        assert_eq!(row.interleaved_with_lemma, "wept Jesus Ἰησοῦς");
        assert_eq!(row.interleaved_with_content, "wept Jesus");
        assert_eq!(row.sort, (4 << 16) | (11 << 8) | 35);
    }

    #[test]
    fn test_build_row_rejects_empty_verse_and_unknown_book() {
        assert_eq!(
            build_row("eng", "ult", "JHN", 1, &verse(1, vec![])),
            Err(RowError::MissingField("verse_text"))
        );
        assert_eq!(
            build_row("eng", "ult", "GEN", 1, &verse(1, vec![AlignedWord::new("In")])),
            Err(RowError::SortKey(SortKeyError::UnknownBook("GEN".to_string())))
        );
    }
}

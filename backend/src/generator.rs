//! Per-corpus chapter generation: query, filter, assemble, write artifacts.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::alignment::{align_chapter, DirectExtraction, LexicalStoreResolution, LexicalStrategy};
use crate::artifact::write_chapter;
use crate::book_sort::{book_info, is_known_book};
use crate::config::{PipelineConfig, StrategyKind};
use crate::corpus::CorpusId;
use crate::item_source::ItemSource;
use crate::lexicon::{FsLexicalStore, LexicalResolver};
use crate::logger;

/// Builds the lexical strategy configured for a corpus.
pub fn make_strategy(config: &PipelineConfig, kind: StrategyKind) -> Arc<dyn LexicalStrategy> {
    match kind {
        StrategyKind::Direct => Arc::new(DirectExtraction::new(config.direct_identifier_width)),
        StrategyKind::LexicalStore => {
            let store = FsLexicalStore::new(&config.lexicon_dir);
            let resolver = LexicalResolver::new(Arc::new(store), config.lexicon_identifier_width);
            Arc::new(LexicalStoreResolution::new(resolver, config.fallback_to_markup_lemma))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub corpus: String,
    pub strategy: String,
    pub documents: usize,
    pub documents_skipped: usize,
    /// Documents whose index chapter count differs from the book table.
    pub chapter_count_mismatches: usize,
    pub chapters_written: usize,
    pub chapters_failed: usize,
    pub verses: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterProgress {
    pub book: String,
    pub chapter: u32,
    pub verses: usize,
}

pub struct CorpusGenerator {
    corpus: CorpusId,
    source: Arc<dyn ItemSource>,
    strategy: Arc<dyn LexicalStrategy>,
    output_dir: PathBuf,
    verbose: bool,
}

impl CorpusGenerator {
    pub fn new(
        corpus: CorpusId,
        source: Arc<dyn ItemSource>,
        strategy: Arc<dyn LexicalStrategy>,
        output_dir: PathBuf,
    ) -> Self {
        CorpusGenerator {
            corpus,
            source,
            strategy,
            output_dir,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn corpus(&self) -> &CorpusId {
        &self.corpus
    }

    /// Writes one artifact per chapter of every known book.
    ///
    /// Query failures are logged and the chapter (or the whole corpus, for the
    /// index) yields nothing. Only a failure to create the output directory is
    /// returned as an error.
    pub fn generate<F>(&self, mut on_chapter: F) -> Result<CorpusStats>
    where
        F: FnMut(&ChapterProgress),
    {
        let corpus_id = self.corpus.artifact_id();
        let corpus_dir = self.output_dir.join(&corpus_id);
        std::fs::create_dir_all(&corpus_dir)
            .with_context(|| format!("Failed to create output directory: {}", corpus_dir.display()))?;

        let mut stats = CorpusStats {
            corpus: corpus_id.clone(),
            strategy: self.strategy.name().to_string(),
            ..Default::default()
        };

        let documents = match self.source.document_index() {
            Ok(d) => d,
            Err(e) => {
                logger::error(&format!("{}: failed to read document index: {}", corpus_id, e));
                return Ok(stats);
            }
        };

        for document in documents {
            if !is_known_book(&document.book_code) {
                logger::warn(&format!("{}: skipping document {} with book code {}", corpus_id, document.document_id, document.book_code));
                stats.documents_skipped += 1;
                continue;
            }
            stats.documents += 1;

            if let Some(book) = book_info(&document.book_code) {
                if document.chapter_count != book.chapter_count {
                    logger::warn(&format!(
                        "{}: {} lists {} chapters, expected {}",
                        corpus_id, document.book_code, document.chapter_count, book.chapter_count
                    ));
                    stats.chapter_count_mismatches += 1;
                }
            }

            for chapter in 1..=document.chapter_count {
                let items = match self.source.chapter_items(&document.document_id, chapter) {
                    Ok(items) => items,
                    Err(e) => {
                        logger::error(&format!("{} {} {}: query failed: {}", corpus_id, document.book_code, chapter, e));
                        stats.chapters_failed += 1;
                        continue;
                    }
                };

                let alignment = align_chapter(&items, self.strategy.as_ref());
                for warning in alignment.warnings.iter() {
                    logger::warn(&format!("{} {} {}: {}", corpus_id, document.book_code, chapter, warning));
                }
                stats.warnings += alignment.warnings.len();

                match write_chapter(&self.output_dir, &corpus_id, &document.book_code, chapter, &alignment.verses) {
                    Ok(path) => {
                        if self.verbose {
                            logger::info(&format!("Saved {}", path.display()));
                        }
                        stats.chapters_written += 1;
                        stats.verses += alignment.verses.len();
                    }
                    Err(e) => {
                        logger::error(&format!("{:#}", e));
                        stats.chapters_failed += 1;
                    }
                }

                on_chapter(&ChapterProgress {
                    book: document.book_code.clone(),
                    chapter,
                    verses: alignment.verses.len(),
                });
            }
        }

        logger::info(&format!(
            "{}: {} chapters written, {} failed, {} verses, {} warnings",
            corpus_id, stats.chapters_written, stats.chapters_failed, stats.verses, stats.warnings
        ));

        Ok(stats)
    }
}

//! End-to-end orchestration of the stages, driven by a [`PipelineConfig`].

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::corpus::discover_corpora;
use crate::db::open_verses_db;
use crate::db::verses::VersesDbHandle;
use crate::generator::{make_strategy, CorpusGenerator};
use crate::item_source::JsonItemSource;
use crate::logger;
use crate::populate::{populate_all, PopulateStats};
use crate::source_corpus::ingest_source_corpus;
use crate::supervisor::{Supervisor, SupervisorSummary};
use crate::validation::{validate_corpora, ValidationReport};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generation: SupervisorSummary,
    pub populate: PopulateStats,
    pub source: PopulateStats,
    pub reports: Vec<ValidationReport>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.generation.is_success() && self.reports.iter().all(|r| r.is_valid())
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    verbose: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config, verbose: false }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn open_db(&self) -> Result<VersesDbHandle> {
        open_verses_db(&self.config.database_path)
            .with_context(|| format!("Failed to open database: {}", self.config.database_path.display()))
    }

    /// Writes chapter artifacts for every corpus, or only for `only`
    /// (matched against the directory name or the artifact id).
    pub fn generate(&self, only: Option<&str>) -> Result<SupervisorSummary> {
        let corpora = discover_corpora(&self.config.documents_dir)?;
        let mut supervisor = Supervisor::new();

        for (corpus, dir) in corpora {
            let artifact_id = corpus.artifact_id();
            if let Some(name) = only {
                if name != corpus.source_name && name != artifact_id {
                    continue;
                }
            }

            let kind = self.config.strategy_for(&artifact_id);
            logger::info(&format!("Generating {} from {} using {} strategy", artifact_id, dir.display(), kind));

            let generator = CorpusGenerator::new(
                corpus,
                Arc::new(JsonItemSource::new(dir)),
                make_strategy(&self.config, kind),
                self.config.output_dir.clone(),
            ).verbose(self.verbose);
            supervisor.add(generator);
        }

        if supervisor.is_empty() {
            match only {
                Some(name) => anyhow::bail!("No corpus named {} in {}", name, self.config.documents_dir.display()),
                None => logger::warn(&format!("No corpora found in {}", self.config.documents_dir.display())),
            }
        }

        Ok(supervisor.run())
    }

    pub fn populate(&self, db: &VersesDbHandle) -> Result<PopulateStats> {
        populate_all(db, &self.config.output_dir)
    }

    pub fn ingest_source(&self, db: &VersesDbHandle) -> Result<PopulateStats> {
        let source = JsonItemSource::new(&self.config.source_corpus_dir);
        ingest_source_corpus(db, &source, &self.config.source_language_code, &self.config.source_version)
    }

    pub fn sort(&self, db: &VersesDbHandle) -> Result<()> {
        logger::info("Sorting verses table");
        db.resort().context("Failed to sort verses table")
    }

    /// Validates one translation corpus against the source corpus.
    pub fn check(&self, db: &VersesDbHandle, language_code: &str, version: &str) -> Result<ValidationReport> {
        let left = db.verse_keys(language_code, version)?;
        let right = db.verse_keys(&self.config.source_language_code, &self.config.source_version)?;

        let left_name = format!("{}_{}", language_code, version);
        let right_name = self.config.source_corpus_id();

        if left.is_empty() {
            logger::warn(&format!("No rows for {} in the database", left_name));
        }

        let report = validate_corpora(&left_name, &left, &right_name, &right);
        for issue in report.issues.iter() {
            logger::error(&issue.to_string());
        }
        logger::info(&format!(
            "Checked {} ({} rows) against {} ({} rows): {} issues",
            left_name, report.left_count, right_name, report.right_count, report.issues.len()
        ));

        Ok(report)
    }

    /// Generate, populate, ingest the source corpus, sort, then check every
    /// translation corpus found in the database.
    pub fn run_all(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let generation = self.generate(None)?;

        let db = self.open_db()?;
        let populate = self.populate(&db)?;
        let source = self.ingest_source(&db)?;
        self.sort(&db)?;

        let mut reports = Vec::new();
        for (lang, ver) in db.corpora()? {
            if lang == self.config.source_language_code && ver == self.config.source_version {
                continue;
            }
            reports.push(self.check(&db, &lang, &ver)?);
        }

        logger::info(&format!("Pipeline finished in {}", logger::format_duration(started.elapsed())));

        Ok(RunSummary {
            generation,
            populate,
            source,
            reports,
        })
    }
}

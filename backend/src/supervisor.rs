//! One worker thread per corpus, reporting back over a channel.
//!
//! Workers share nothing but the filesystem. A failed or panicking worker is
//! recorded and the others run to completion.

use std::collections::BTreeSet;
use std::sync::mpsc;
use std::thread;

use serde::Serialize;

use crate::generator::{CorpusGenerator, CorpusStats};
use crate::logger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    Progress { corpus: String, book: String, chapter: u32, verses: usize },
    Completed(CorpusStats),
    Failed { corpus: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum WorkerOutcome {
    Completed(CorpusStats),
    Failed { corpus: String, error: String },
}

impl WorkerOutcome {
    pub fn corpus(&self) -> &str {
        match self {
            WorkerOutcome::Completed(stats) => &stats.corpus,
            WorkerOutcome::Failed { corpus, .. } => corpus,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorSummary {
    pub outcomes: Vec<WorkerOutcome>,
}

impl SupervisorSummary {
    pub fn completed(&self) -> impl Iterator<Item = &CorpusStats> {
        self.outcomes.iter().filter_map(|o| match o {
            WorkerOutcome::Completed(stats) => Some(stats),
            WorkerOutcome::Failed { .. } => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, WorkerOutcome::Failed { .. })).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

#[derive(Default)]
pub struct Supervisor {
    jobs: Vec<CorpusGenerator>,
}

impl Supervisor {
    pub fn new() -> Self {
        Supervisor::default()
    }

    pub fn add(&mut self, job: CorpusGenerator) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn run(self) -> SupervisorSummary {
        self.run_with(|_| {})
    }

    /// Runs all jobs in parallel, passing every worker message to `on_message`
    /// as it arrives. Outcomes are sorted by corpus.
    pub fn run_with<F>(self, mut on_message: F) -> SupervisorSummary
    where
        F: FnMut(&WorkerMessage),
    {
        let (tx, rx) = mpsc::channel::<WorkerMessage>();
        let mut handles = Vec::new();
        let mut summary = SupervisorSummary::default();

        for job in self.jobs {
            let corpus = job.corpus().artifact_id();
            let worker_tx = tx.clone();
            let worker_corpus = corpus.clone();

            let spawned = thread::Builder::new()
                .name(format!("generate-{}", corpus))
                .spawn(move || {
                    let progress_tx = worker_tx.clone();
                    let result = job.generate(|p| {
                        let _ = progress_tx.send(WorkerMessage::Progress {
                            corpus: worker_corpus.clone(),
                            book: p.book.clone(),
                            chapter: p.chapter,
                            verses: p.verses,
                        });
                    });

                    let message = match result {
                        Ok(stats) => WorkerMessage::Completed(stats),
                        Err(e) => WorkerMessage::Failed {
                            corpus: worker_corpus,
                            error: format!("{:#}", e),
                        },
                    };
                    let _ = worker_tx.send(message);
                });

            match spawned {
                Ok(handle) => handles.push((corpus, handle)),
                Err(e) => summary.outcomes.push(WorkerOutcome::Failed {
                    corpus,
                    error: format!("Failed to spawn worker: {}", e),
                }),
            }
        }

        // Workers hold the remaining senders; recv ends when all have finished.
        drop(tx);

        let mut reported: BTreeSet<String> = BTreeSet::new();
        while let Ok(message) = rx.recv() {
            on_message(&message);
            match message {
                WorkerMessage::Progress { corpus, book, chapter, verses } => {
                    logger::debug(&format!("Worker {}: {} {} ({} verses)", corpus, book, chapter, verses));
                }
                WorkerMessage::Completed(stats) => {
                    logger::info(&format!("Worker {}: completed", stats.corpus));
                    reported.insert(stats.corpus.clone());
                    summary.outcomes.push(WorkerOutcome::Completed(stats));
                }
                WorkerMessage::Failed { corpus, error } => {
                    logger::error(&format!("Worker {} encountered an error: {}", corpus, error));
                    reported.insert(corpus.clone());
                    summary.outcomes.push(WorkerOutcome::Failed { corpus, error });
                }
            }
        }

        for (corpus, handle) in handles {
            if handle.join().is_err() && !reported.contains(&corpus) {
                logger::error(&format!("Worker {} panicked", corpus));
                summary.outcomes.push(WorkerOutcome::Failed {
                    corpus,
                    error: "worker panicked".to_string(),
                });
            }
        }

        summary.outcomes.sort_by(|a, b| a.corpus().cmp(b.corpus()));
        summary
    }
}

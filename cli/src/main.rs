use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use interlinear_backend::config::PipelineConfig;
use interlinear_backend::lexicon::{audit_headers, write_headword_index};
use interlinear_backend::logger;
use interlinear_backend::pipeline::Pipeline;
use interlinear_backend::supervisor::WorkerOutcome;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interlinear alignment data pipeline", long_about = None)]
struct Cli {
    /// Optional JSON file overriding the environment configuration.
    #[arg(long, global = true, value_name = "FILE_PATH", env = "INTERLINEAR_CONFIG")]
    config: Option<PathBuf>,

    /// Log each written artifact
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// silent, error, warn, info or debug. Overrides LOG_LEVEL.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write per-chapter alignment artifacts, one worker per corpus
    Generate {
        /// Only this corpus, e.g. en_ult or eng_ult
        #[arg(long, value_name = "LANG_VERSION")]
        corpus: Option<String>,
    },

    /// Load the artifacts into the database
    Populate,

    /// Insert the source-language corpus rows
    IngestSource,

    /// Rewrite the verses table in sort key order. Run after all inserts.
    Sort,

    /// Validate a translation corpus against the source corpus
    #[command(arg_required_else_help = true)]
    Check {
        #[arg(long, value_name = "CODE")]
        language: String,

        /// Version of the translation, e.g. ult. Not the program version.
        #[arg(long, value_name = "VERSION")]
        version: String,
    },

    /// Generate, populate, ingest source, sort and check, in that order
    Run,

    /// Write a headword to identifier map of the lexical store
    #[command(arg_required_else_help = true)]
    LexiconIndex {
        #[arg(long, value_name = "FILE_PATH")]
        output: PathBuf,
    },

    /// List lexical store entries without a headword heading
    LexiconAudit,
}

fn generate(pipeline: &Pipeline, corpus: Option<&str>) -> Result<(), String> {
    let summary = pipeline.generate(corpus).map_err(|e| format!("{:#}", e))?;

    for outcome in summary.outcomes.iter() {
        match outcome {
            WorkerOutcome::Completed(stats) => println!(
                "{}: {} chapters, {} verses, {} warnings ({} strategy)",
                stats.corpus, stats.chapters_written, stats.verses, stats.warnings, stats.strategy
            ),
            WorkerOutcome::Failed { corpus, error } => println!("{}: failed: {}", corpus, error),
        }
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(format!("{} corpora failed", summary.failed_count()))
    }
}

fn populate(pipeline: &Pipeline) -> Result<(), String> {
    let db = pipeline.open_db().map_err(|e| format!("{:#}", e))?;
    let stats = pipeline.populate(&db).map_err(|e| format!("{:#}", e))?;
    println!(
        "Inserted {} rows from {} chapters ({} dropped, {} duplicates, {} failed)",
        stats.rows_inserted, stats.chapters, stats.rows_dropped, stats.duplicates, stats.rows_failed
    );
    Ok(())
}

fn ingest_source(pipeline: &Pipeline) -> Result<(), String> {
    let db = pipeline.open_db().map_err(|e| format!("{:#}", e))?;
    let stats = pipeline.ingest_source(&db).map_err(|e| format!("{:#}", e))?;
    println!(
        "Inserted {} source rows ({} dropped, {} duplicates)",
        stats.rows_inserted, stats.rows_dropped, stats.duplicates
    );
    Ok(())
}

fn sort(pipeline: &Pipeline) -> Result<(), String> {
    let db = pipeline.open_db().map_err(|e| format!("{:#}", e))?;
    pipeline.sort(&db).map_err(|e| format!("{:#}", e))
}

fn check(pipeline: &Pipeline, language: &str, version: &str) -> Result<(), String> {
    let db = pipeline.open_db().map_err(|e| format!("{:#}", e))?;
    let report = pipeline.check(&db, language, version).map_err(|e| format!("{:#}", e))?;

    for issue in report.issues.iter() {
        println!("{}", issue);
    }

    if report.is_valid() {
        println!("{} matches {}: {} verses", report.left, report.right, report.left_count);
        Ok(())
    } else {
        Err(format!("{} issues between {} and {}", report.issues.len(), report.left, report.right))
    }
}

fn run(pipeline: &Pipeline) -> Result<(), String> {
    let summary = pipeline.run_all().map_err(|e| format!("{:#}", e))?;

    println!(
        "Generated {} corpora, inserted {} translation rows and {} source rows",
        summary.generation.completed().count(),
        summary.populate.rows_inserted,
        summary.source.rows_inserted
    );
    for report in summary.reports.iter() {
        println!("{}: {} issues", report.left, report.issues.len());
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err("Pipeline finished with failures".to_string())
    }
}

fn main() {
    if dotenv().is_err() {
        println!("Info: No .env file found or failed to load.");
    }

    let cli = Cli::parse();

    if let Some(level) = cli.log_level.as_deref() {
        if !logger::set_log_level_str(level) {
            eprintln!("Unknown log level: {}", level);
            exit(1);
        }
    }

    let config = match PipelineConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            exit(1);
        }
    };

    let lexicon_dir = config.lexicon_dir.clone();
    let pipeline = Pipeline::new(config).verbose(cli.verbose);

    let command_result = match cli.command {
        Commands::Generate { corpus } => generate(&pipeline, corpus.as_deref()),

        Commands::Populate => populate(&pipeline),

        Commands::IngestSource => ingest_source(&pipeline),

        Commands::Sort => sort(&pipeline),

        Commands::Check { language, version } => check(&pipeline, &language, &version),

        Commands::Run => run(&pipeline),

        Commands::LexiconIndex { output } => {
            write_headword_index(&lexicon_dir, &output)
                .map(|n| println!("Wrote {} headwords to {}", n, output.display()))
                .map_err(|e| format!("{:#}", e))
        }

        Commands::LexiconAudit => {
            audit_headers(&lexicon_dir)
                .map(|paths| {
                    for p in paths.iter() {
                        println!("{}", p.display());
                    }
                    println!("{} malformed entries", paths.len());
                })
                .map_err(|e| format!("{:#}", e))
        }
    };

    if let Err(e) = command_result {
        logger::error(&e);
        eprintln!("Error executing command: {}", e);
        exit(1);
    }
}

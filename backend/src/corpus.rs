//! Corpus directory naming (`<lang>_<version>`) and discovery.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::logger;

lazy_static! {
    static ref CORPUS_NAME_REGEX: Regex = Regex::new(r"^([^_]+)_(.+)$").unwrap();

    /// Two-letter directory prefixes to the three-letter codes used in artifacts and rows
    static ref LANGUAGE_CODES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("en", "eng");
        m.insert("hi", "hin");
        m.insert("ne", "nep");
        m.insert("vi", "vie");
        m.insert("mr", "mar");
        m.insert("bn", "ben");
        m.insert("ru", "rus");
        m.insert("or", "ori");
        m.insert("gu", "guj");
        m.insert("kn", "kan");
        m.insert("te", "tei");
        m.insert("ur", "urd");
        m
    };
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("corpus directory name '{0}' is not of the form <lang>_<version>")]
pub struct CorpusNameError(pub String);

pub fn map_language_code(code: &str) -> String {
    if let Some(mapped) = LANGUAGE_CODES.get(code) {
        return mapped.to_string();
    }
    if !LANGUAGE_CODES.values().any(|v| *v == code) {
        logger::warn(&format!("No language code mapping for '{}', using it as is", code));
    }
    code.to_string()
}

/// One translation corpus, named after its input directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorpusId {
    /// Directory name as found on disk, e.g. `en_ult`.
    pub source_name: String,
    pub language_code: String,
    pub version: String,
}

impl CorpusId {
    pub fn new(language_code: &str, version: &str) -> Self {
        CorpusId {
            source_name: format!("{}_{}", language_code, version),
            language_code: language_code.to_string(),
            version: version.to_string(),
        }
    }

    /// Name of the artifact directory and of the corpus in reports, e.g. `eng_ult`.
    pub fn artifact_id(&self) -> String {
        format!("{}_{}", self.language_code, self.version)
    }
}

impl fmt::Display for CorpusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.artifact_id())
    }
}

pub fn parse_corpus_name(name: &str) -> Result<CorpusId, CorpusNameError> {
    let caps = CORPUS_NAME_REGEX
        .captures(name)
        .ok_or_else(|| CorpusNameError(name.to_string()))?;

    Ok(CorpusId {
        source_name: name.to_string(),
        language_code: map_language_code(&caps[1]),
        version: caps[2].to_string(),
    })
}

/// Sub-directories of `root` that parse as corpus names, sorted by name.
pub fn discover_corpora(root: &Path) -> anyhow::Result<Vec<(CorpusId, PathBuf)>> {
    if !root.is_dir() {
        anyhow::bail!("Corpus directory not found: {}", root.display());
    }

    let mut corpora = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let name = entry.file_name().to_string_lossy().to_string();
        match parse_corpus_name(&name) {
            Ok(id) => corpora.push((id, entry.into_path())),
            Err(e) => logger::warn(&format!("Skipping directory: {}", e)),
        }
    }

    Ok(corpora)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_name() {
        let id = parse_corpus_name("en_ult").unwrap();
        assert_eq!(id.source_name, "en_ult");
        assert_eq!(id.language_code, "eng");
        assert_eq!(id.version, "ult");
        assert_eq!(id.artifact_id(), "eng_ult");

        let id = parse_corpus_name("hi_irv_2019").unwrap();
        assert_eq!(id.language_code, "hin");
        assert_eq!(id.version, "irv_2019");

        assert_eq!(parse_corpus_name("eng_ult").unwrap().artifact_id(), "eng_ult");
        assert!(parse_corpus_name("ult").is_err());
        assert!(parse_corpus_name("_ult").is_err());
    }

    #[test]
    fn test_discover_corpora_skips_files_and_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("vi_ulb")).unwrap();
        std::fs::create_dir(dir.path().join("en_ult")).unwrap();
        std::fs::create_dir(dir.path().join("scratch")).unwrap();
        std::fs::write(dir.path().join("ne_ulb"), "").unwrap();

        let corpora = discover_corpora(dir.path()).unwrap();
        let ids: Vec<String> = corpora.iter().map(|(id, _)| id.artifact_id()).collect();
        assert_eq!(ids, vec!["eng_ult", "vie_ulb"]);
        assert_eq!(corpora[0].1, dir.path().join("en_ult"));
    }

    #[test]
    fn test_discover_missing_root_fails() {
        assert!(discover_corpora(Path::new("/nonexistent/corpora")).is_err());
    }
}

//! Intermediate per-chapter JSON artifacts: `<output>/<corpusId>/<BOOK>-<chapter>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ChapterOutput;

lazy_static! {
    static ref ARTIFACT_NAME_REGEX: Regex = Regex::new(r"^(\d*[A-Z]+)-(\d+)\.json$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub book: String,
    pub chapter: u32,
}

pub fn artifact_file_name(book_code: &str, chapter: u32) -> String {
    format!("{}-{}.json", book_code, chapter)
}

pub fn artifact_path(output_dir: &Path, corpus_id: &str, book_code: &str, chapter: u32) -> PathBuf {
    output_dir.join(corpus_id).join(artifact_file_name(book_code, chapter))
}

/// Book code and chapter from an artifact file name, e.g. `1CO-13.json`.
pub fn parse_artifact_name(file_name: &str) -> Option<(String, u32)> {
    let caps = ARTIFACT_NAME_REGEX.captures(file_name)?;
    let chapter = caps[2].parse::<u32>().ok()?;
    Some((caps[1].to_string(), chapter))
}

pub fn write_chapter(output_dir: &Path, corpus_id: &str, book_code: &str, chapter: u32, verses: &ChapterOutput) -> Result<PathBuf> {
    let path = artifact_path(output_dir, corpus_id, book_code, chapter);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(verses)
        .context("Failed to serialize chapter")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write artifact: {}", path.display()))?;

    Ok(path)
}

pub fn read_chapter(path: &Path) -> Result<ChapterOutput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read artifact: {}", path.display()))?;
    let verses: ChapterOutput = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse artifact: {}", path.display()))?;
    Ok(verses)
}

/// Artifacts of one corpus directory, sorted by file name. Files whose
/// names don't match the artifact pattern are skipped.
pub fn list_artifacts(corpus_dir: &Path) -> Result<Vec<ArtifactFile>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(corpus_dir)
        .with_context(|| format!("Failed to list artifacts in: {}", corpus_dir.display()))?;

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        if let Some((book, chapter)) = parse_artifact_name(&name) {
            files.push(ArtifactFile { path, book, chapter });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlignedVerse, AlignedWord};

    #[test]
    fn test_parse_artifact_name() {
        assert_eq!(parse_artifact_name("JHN-1.json"), Some(("JHN".to_string(), 1)));
        assert_eq!(parse_artifact_name("1CO-13.json"), Some(("1CO".to_string(), 13)));
        assert_eq!(parse_artifact_name("jhn-1.json"), None);
        assert_eq!(parse_artifact_name("JHN-1.txt"), None);
        assert_eq!(parse_artifact_name("index.json"), None);
    }

    #[test]
    fn test_write_then_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let verses = vec![AlignedVerse {
            verse_num: 1,
            aligned_verse_text: vec![AlignedWord::new("Paul")],
        }];

        let path = write_chapter(dir.path(), "eng_ult", "ROM", 1, &verses).unwrap();
        assert_eq!(path, dir.path().join("eng_ult").join("ROM-1.json"));
        fs::write(dir.path().join("eng_ult").join("notes.json"), "[]").unwrap();

        let listed = list_artifacts(&dir.path().join("eng_ult")).unwrap();
        assert_eq!(listed, vec![ArtifactFile { path: path.clone(), book: "ROM".to_string(), chapter: 1 }]);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"verseNum\": 1"));
        assert!(text.contains("\"alignedVerseText\""));

        assert_eq!(read_chapter(&path).unwrap(), verses);
    }
}

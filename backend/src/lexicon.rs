//! Lexical reference resolution.
//!
//! The lexical store is a directory tree with one markdown file per
//! source-language identifier, bucketed by decade:
//! `<store>/g0741-g0750/g0746.md`. The bucket layout is fixed by the store and
//! must not drift from [`bucket_for`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::logger;

lazy_static! {
    /// Numeric lexical code embedded in an attribute payload, e.g. `.../G25320`
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"\b[Gg]([0-9]+)\b").unwrap();

    /// First heading line, capturing the headword up to whitespace or '/'
    static ref HEADWORD_REGEX: Regex = Regex::new(r"(?m)^#+[ \t]*([^\s/]+)").unwrap();

    static ref MALFORMED_HEADER_REGEX: Regex = Regex::new(r"^G[0-9]+").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("identifier width must be 4 or 5, got {0}")]
pub struct InvalidWidth(pub u8);

/// Number of digits in a canonical identifier (and in bucket endpoints).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IdentifierWidth {
    Four,
    Five,
}

impl IdentifierWidth {
    pub fn digits(&self) -> usize {
        match self {
            IdentifierWidth::Four => 4,
            IdentifierWidth::Five => 5,
        }
    }
}

impl TryFrom<u8> for IdentifierWidth {
    type Error = InvalidWidth;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(IdentifierWidth::Four),
            5 => Ok(IdentifierWidth::Five),
            other => Err(InvalidWidth(other)),
        }
    }
}

impl From<IdentifierWidth> for u8 {
    fn from(width: IdentifierWidth) -> u8 {
        width.digits() as u8
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("no lexical code in attribute payload: {0}")]
    MalformedIdentifier(String),
    #[error("{identifier} not found in lexical store at {path}")]
    NotFound { identifier: String, path: String },
    #[error("no headword heading in lexical entry {0}")]
    MissingHeadword(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

/// Extracts the numeric code from a raw payload and fixes it to `width` digits.
///
/// Longer codes are truncated (`G25320` at width 4 is `g2532`), shorter ones
/// are left-padded with zeros.
pub fn normalize_identifier(raw: &str, width: IdentifierWidth) -> Result<String, LexicalError> {
    let caps = IDENTIFIER_REGEX
        .captures(raw)
        .ok_or_else(|| LexicalError::MalformedIdentifier(raw.to_string()))?;
    let digits = &caps[1];
    let w = width.digits();

    let fixed = if digits.len() >= w {
        digits[..w].to_string()
    } else {
        format!("{:0>w$}", digits, w = w)
    };

    Ok(format!("g{}", fixed))
}

fn identifier_number(identifier: &str) -> Result<u32, LexicalError> {
    identifier
        .strip_prefix('g')
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(|| LexicalError::MalformedIdentifier(identifier.to_string()))
}

/// The store directory holding a canonical identifier.
pub fn bucket_for(identifier: &str, width: IdentifierWidth) -> Result<String, LexicalError> {
    let n = identifier_number(identifier)?;

    let (start, end) = if n <= 10 {
        (1, 10)
    } else if n % 10 == 0 {
        (n - 9, n)
    } else {
        (n - (n % 10) + 1, n - (n % 10) + 10)
    };

    let w = width.digits();
    Ok(format!("g{:0w$}-g{:0w$}", start, end, w = w))
}

pub fn extract_headword(content: &str) -> Option<String> {
    HEADWORD_REGEX
        .captures(content)
        .map(|caps| caps[1].to_string())
}

/// First bullet item under a heading mentioning glosses, if the entry has one.
pub fn extract_gloss(content: &str) -> Option<String> {
    let mut in_glosses = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            in_glosses = trimmed.to_lowercase().contains("gloss");
            continue;
        }
        if !in_glosses {
            continue;
        }
        if let Some(item) = trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("- ")) {
            let item = item.trim();
            if !item.is_empty() {
                return Some(item.to_string());
            }
        }
    }

    None
}

/// Read access to the external lexical store.
pub trait LexicalStore: Send + Sync {
    fn read_entry(&self, bucket: &str, identifier: &str) -> Result<String, LexicalError>;
}

#[derive(Debug, Clone)]
pub struct FsLexicalStore {
    root: PathBuf,
}

impl FsLexicalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsLexicalStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, bucket: &str, identifier: &str) -> PathBuf {
        self.root.join(bucket).join(format!("{}.md", identifier))
    }
}

impl LexicalStore for FsLexicalStore {
    fn read_entry(&self, bucket: &str, identifier: &str) -> Result<String, LexicalError> {
        let path = self.entry_path(bucket, identifier);
        if !path.is_file() {
            return Err(LexicalError::NotFound {
                identifier: identifier.to_string(),
                path: path.display().to_string(),
            });
        }
        fs::read_to_string(&path).map_err(|e| LexicalError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLexeme {
    pub identifier: String,
    pub headword: String,
    pub content: Option<String>,
}

/// Normalizes an identifier and looks its headword up in a [`LexicalStore`].
#[derive(Clone)]
pub struct LexicalResolver {
    store: Arc<dyn LexicalStore>,
    width: IdentifierWidth,
}

impl LexicalResolver {
    pub fn new(store: Arc<dyn LexicalStore>, width: IdentifierWidth) -> Self {
        LexicalResolver { store, width }
    }

    pub fn width(&self) -> IdentifierWidth {
        self.width
    }

    pub fn normalize(&self, raw: &str) -> Result<String, LexicalError> {
        normalize_identifier(raw, self.width)
    }

    pub fn resolve(&self, raw: &str) -> Result<ResolvedLexeme, LexicalError> {
        let identifier = self.normalize(raw)?;
        self.resolve_identifier(&identifier)
    }

    pub fn resolve_identifier(&self, identifier: &str) -> Result<ResolvedLexeme, LexicalError> {
        let bucket = bucket_for(identifier, self.width)?;
        let entry = self.store.read_entry(&bucket, identifier)?;

        let headword = extract_headword(&entry)
            .ok_or_else(|| LexicalError::MissingHeadword(identifier.to_string()))?;

        Ok(ResolvedLexeme {
            identifier: identifier.to_string(),
            headword,
            content: extract_gloss(&entry),
        })
    }
}

fn markdown_entries(store_root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(store_root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file() && path.extension().map(|ext| ext.eq_ignore_ascii_case("md")).unwrap_or(false)
        })
}

/// Maps every headword in the store to the identifier of its entry.
///
/// Entries without a heading are logged and skipped. When two entries share a
/// headword the later one (in file name order) wins.
pub fn headword_index(store_root: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    if !store_root.is_dir() {
        anyhow::bail!("Lexical store directory not found: {}", store_root.display());
    }

    let mut index = BTreeMap::new();

    for path in markdown_entries(store_root) {
        let identifier = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                logger::error(&format!("Failed to read {}: {}", path.display(), e));
                continue;
            }
        };

        match extract_headword(&content) {
            Some(headword) => {
                index.insert(headword, identifier);
            }
            None => logger::warn(&format!("Could not match headword in {}", path.display())),
        }
    }

    Ok(index)
}

/// Writes [`headword_index`] as pretty JSON. Returns the number of headwords.
pub fn write_headword_index(store_root: &Path, output: &Path) -> anyhow::Result<usize> {
    use anyhow::Context;

    let index = headword_index(store_root)?;
    let json = serde_json::to_string_pretty(&index)
        .context("Failed to serialize headword index")?;
    fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(index.len())
}

/// Lists entries whose content starts with a bare `G<digits>` code instead of a heading.
pub fn audit_headers(store_root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !store_root.is_dir() {
        anyhow::bail!("Lexical store directory not found: {}", store_root.display());
    }

    let mut malformed = Vec::new();
    for path in markdown_entries(store_root) {
        match fs::read_to_string(&path) {
            Ok(content) => {
                if MALFORMED_HEADER_REGEX.is_match(&content) {
                    malformed.push(path);
                }
            }
            Err(e) => logger::error(&format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    Ok(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<String, String>);

    impl LexicalStore for MapStore {
        fn read_entry(&self, bucket: &str, identifier: &str) -> Result<String, LexicalError> {
            let key = format!("{}/{}", bucket, identifier);
            self.0.get(&key).cloned().ok_or(LexicalError::NotFound {
                identifier: identifier.to_string(),
                path: key,
            })
        }
    }

    #[test]
    fn test_normalize_truncates_and_pads() {
        let payload = "attribute/milestone/zaln/x-strong/0/G25320";
        assert_eq!(normalize_identifier(payload, IdentifierWidth::Four), Ok("g2532".to_string()));
        assert_eq!(normalize_identifier(payload, IdentifierWidth::Five), Ok("g25320".to_string()));
        assert_eq!(normalize_identifier("x-strong/0/G7", IdentifierWidth::Four), Ok("g0007".to_string()));
        assert_eq!(normalize_identifier("x-strong/0/G746", IdentifierWidth::Five), Ok("g00746".to_string()));
    }

    #[test]
    fn test_normalize_rejects_payload_without_code() {
        let err = normalize_identifier("attribute/milestone/zaln/x-strong/0/", IdentifierWidth::Four);
        assert!(matches!(err, Err(LexicalError::MalformedIdentifier(_))));
        assert!(normalize_identifier("x-strong/0/H1234", IdentifierWidth::Four).is_err());
    }

    #[test]
    fn test_normalize_rejects_non_ascii_digits() {
        let err = normalize_identifier("attribute/milestone/zaln/x-strong/0/G१२३४५", IdentifierWidth::Four);
        assert!(matches!(err, Err(LexicalError::MalformedIdentifier(_))));
        let err = normalize_identifier("x-strong/0/G２５３２", IdentifierWidth::Five);
        assert!(matches!(err, Err(LexicalError::MalformedIdentifier(_))));
    }

    #[test]
    fn test_bucket_for() {
        assert_eq!(bucket_for("g1234", IdentifierWidth::Four), Ok("g1231-g1240".to_string()));
        assert_eq!(bucket_for("g0007", IdentifierWidth::Four), Ok("g0001-g0010".to_string()));
        assert_eq!(bucket_for("g0010", IdentifierWidth::Four), Ok("g0001-g0010".to_string()));
        assert_eq!(bucket_for("g0020", IdentifierWidth::Four), Ok("g0011-g0020".to_string()));
        assert_eq!(bucket_for("g0011", IdentifierWidth::Four), Ok("g0011-g0020".to_string()));
        assert_eq!(bucket_for("g25320", IdentifierWidth::Five), Ok("g25311-g25320".to_string()));
    }

    #[test]
    fn test_bucket_after_truncation() {
        let identifier = normalize_identifier("G12345", IdentifierWidth::Four).unwrap();
        assert_eq!(identifier, "g1234");
        assert_eq!(bucket_for(&identifier, IdentifierWidth::Four), Ok("g1231-g1240".to_string()));
    }

    #[test]
    fn test_extract_headword() {
        assert_eq!(extract_headword("# ἀρχή\n\n## Word data:\n"), Some("ἀρχή".to_string()));
        assert_eq!(extract_headword("#καί / κἀγώ\n"), Some("καί".to_string()));
        assert_eq!(extract_headword("G2532\nno heading here"), None);
    }

    #[test]
    fn test_extract_gloss() {
        let entry = "# ἀρχή\n\n## Word data:\n\n* Strongs: G07460\n\n## Glosses:\n\n* beginning\n* origin\n";
        assert_eq!(extract_gloss(entry), Some("beginning".to_string()));
        assert_eq!(extract_gloss("# καί\n\n* and\n"), None);
    }

    #[test]
    fn test_resolver_reads_bucketed_entry() {
        let mut entries = HashMap::new();
        entries.insert("g2531-g2540/g2532".to_string(), "# arche\n".to_string());
        let resolver = LexicalResolver::new(Arc::new(MapStore(entries)), IdentifierWidth::Four);

        let resolved = resolver.resolve("attribute/milestone/zaln/x-strong/0/G25320").unwrap();
        assert_eq!(resolved, ResolvedLexeme {
            identifier: "g2532".to_string(),
            headword: "arche".to_string(),
            content: None,
        });

        let missing = resolver.resolve("x-strong/0/G00010");
        assert!(matches!(missing, Err(LexicalError::NotFound { .. })));
    }

    #[test]
    fn test_fs_store_and_index_utilities() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("g0741-g0750");
        fs::create_dir_all(&bucket).unwrap();
        fs::write(bucket.join("g0746.md"), "# ἀρχή\n\n## Glosses:\n\n* beginning\n").unwrap();
        fs::write(bucket.join("g0747.md"), "G0747\n# broken\n").unwrap();

        let store = FsLexicalStore::new(dir.path());
        let resolver = LexicalResolver::new(Arc::new(store), IdentifierWidth::Four);
        let resolved = resolver.resolve("G07460").unwrap();
        assert_eq!(resolved.headword, "ἀρχή");
        assert_eq!(resolved.content.as_deref(), Some("beginning"));

        let index = headword_index(dir.path()).unwrap();
        assert_eq!(index.get("ἀρχή").map(String::as_str), Some("g0746"));
        assert_eq!(index.get("broken").map(String::as_str), Some("g0747"));

        let malformed = audit_headers(dir.path()).unwrap();
        assert_eq!(malformed, vec![bucket.join("g0747.md")]);
    }
}

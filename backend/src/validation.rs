//! Cross-corpus verification.
//!
//! Two corpora meant to be verse-aligned are compared by `(book, chapter, verse)`:
//! duplicates within a corpus, keys present on one side only, and shared keys
//! whose sort keys differ are all reported.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VerseKey {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl VerseKey {
    pub fn new(book: &str, chapter: u32, verse: u32) -> Self {
        VerseKey {
            book: book.to_string(),
            chapter,
            verse,
        }
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

/// One `(book, chapter, verse, sort)` tuple of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseKeyRow {
    pub key: VerseKey,
    pub sort: u32,
}

impl VerseKeyRow {
    pub fn new(book: &str, chapter: u32, verse: u32, sort: u32) -> Self {
        VerseKeyRow {
            key: VerseKey::new(book, chapter, verse),
            sort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationIssue {
    Duplicate { corpus: String, key: VerseKey, count: usize },
    Missing { key: VerseKey, present_in: String, missing_from: String },
    SortMismatch { key: VerseKey, left: u32, right: u32 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Duplicate { corpus, key, count } => {
                write!(f, "Duplicate verse in {}: {} ({} rows)", corpus, key, count)
            }
            ValidationIssue::Missing { key, present_in, missing_from } => {
                write!(f, "Missing verse in {}: {} (present in {})", missing_from, key, present_in)
            }
            ValidationIssue::SortMismatch { key, left, right } => {
                write!(f, "Sort mismatch for {}: {} != {}", key, left, right)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub left: String,
    pub right: String,
    pub left_count: usize,
    pub right_count: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Groups rows by key, keeping the first sort value seen, and reports duplicates.
fn index_corpus(name: &str, rows: &[VerseKeyRow], issues: &mut Vec<ValidationIssue>) -> BTreeMap<VerseKey, u32> {
    let mut counts: BTreeMap<&VerseKey, usize> = BTreeMap::new();
    let mut index = BTreeMap::new();

    for row in rows {
        *counts.entry(&row.key).or_insert(0) += 1;
        index.entry(row.key.clone()).or_insert(row.sort);
    }

    for (key, count) in counts {
        if count > 1 {
            issues.push(ValidationIssue::Duplicate {
                corpus: name.to_string(),
                key: key.clone(),
                count,
            });
        }
    }

    index
}

/// Compares two corpora. Issues come out in a stable order: duplicates of
/// the left corpus, duplicates of the right, then key issues in key order.
pub fn validate_corpora(left_name: &str, left: &[VerseKeyRow], right_name: &str, right: &[VerseKeyRow]) -> ValidationReport {
    let mut issues = Vec::new();

    let left_index = index_corpus(left_name, left, &mut issues);
    let right_index = index_corpus(right_name, right, &mut issues);

    let all_keys: BTreeSet<&VerseKey> = left_index.keys().chain(right_index.keys()).collect();

    for key in all_keys {
        match (left_index.get(key), right_index.get(key)) {
            (Some(l), Some(r)) => {
                if l != r {
                    issues.push(ValidationIssue::SortMismatch {
                        key: key.clone(),
                        left: *l,
                        right: *r,
                    });
                }
            }
            (Some(_), None) => issues.push(ValidationIssue::Missing {
                key: key.clone(),
                present_in: left_name.to_string(),
                missing_from: right_name.to_string(),
            }),
            (None, Some(_)) => issues.push(ValidationIssue::Missing {
                key: key.clone(),
                present_in: right_name.to_string(),
                missing_from: left_name.to_string(),
            }),
            (None, None) => {}
        }
    }

    ValidationReport {
        left: left_name.to_string(),
        right: right_name.to_string(),
        left_count: left.len(),
        right_count: right.len(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book_sort::sort_key;

    fn rows(keys: &[(&str, u32, u32)]) -> Vec<VerseKeyRow> {
        keys.iter()
            .map(|(b, c, v)| VerseKeyRow::new(b, *c, *v, sort_key(b, *c, *v).unwrap()))
            .collect()
    }

    #[test]
    fn test_same_triples_are_valid() {
        let keys = [("JHN", 1, 1), ("JHN", 1, 2), ("REV", 22, 21)];
        let report = validate_corpora("eng_ult", &rows(&keys), "koine_ugnt", &rows(&keys));
        assert!(report.is_valid());
        assert_eq!(report.left_count, 3);
    }

    #[test]
    fn test_duplicate_is_flagged() {
        let left = rows(&[("JHN", 1, 1), ("JHN", 1, 1), ("JHN", 1, 2)]);
        let right = rows(&[("JHN", 1, 1), ("JHN", 1, 2)]);

        let report = validate_corpora("eng_ult", &left, "koine_ugnt", &right);
        assert_eq!(report.issues, vec![ValidationIssue::Duplicate {
            corpus: "eng_ult".to_string(),
            key: VerseKey::new("JHN", 1, 1),
            count: 2,
        }]);
    }

    #[test]
    fn test_missing_both_ways() {
        let left = rows(&[("MAT", 1, 1), ("MAT", 1, 2)]);
        let right = rows(&[("MAT", 1, 1), ("MAT", 1, 3)]);

        let report = validate_corpora("eng_ult", &left, "koine_ugnt", &right);
        assert_eq!(report.issues, vec![
            ValidationIssue::Missing {
                key: VerseKey::new("MAT", 1, 2),
                present_in: "eng_ult".to_string(),
                missing_from: "koine_ugnt".to_string(),
            },
            ValidationIssue::Missing {
                key: VerseKey::new("MAT", 1, 3),
                present_in: "koine_ugnt".to_string(),
                missing_from: "eng_ult".to_string(),
            },
        ]);
    }

    #[test]
    fn test_sort_mismatch() {
        let left = vec![VerseKeyRow::new("ACT", 2, 4, 1)];
        let right = rows(&[("ACT", 2, 4)]);

        let report = validate_corpora("a", &left, "b", &right);
        assert!(!report.is_valid());
        assert!(matches!(report.issues[0], ValidationIssue::SortMismatch { left: 1, .. }));
        assert_eq!(report.issues[0].to_string(), format!("Sort mismatch for ACT 2:4: 1 != {}", sort_key("ACT", 2, 4).unwrap()));
    }

    #[test]
    fn test_empty_corpora_are_valid() {
        assert!(validate_corpora("a", &[], "b", &[]).is_valid());
    }
}

//! Canonical New Testament book order and the packed verse sort key.
//!
//! The sort key is the cross-corpus join key: a translation and the
//! source-language text must produce the same key for the same verse.

use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookInfo {
    /// Book code as used in document headers and artifact names, e.g. "1CO".
    pub code: &'static str,
    pub chapter_count: u32,
}

/// The fixed 27-book ordering. A book's sort index is its 1-based position here.
pub static NEW_TESTAMENT_BOOKS: [BookInfo; 27] = [
    BookInfo { code: "MAT", chapter_count: 28 },
    BookInfo { code: "MRK", chapter_count: 16 },
    BookInfo { code: "LUK", chapter_count: 24 },
    BookInfo { code: "JHN", chapter_count: 21 },
    BookInfo { code: "ACT", chapter_count: 28 },
    BookInfo { code: "ROM", chapter_count: 16 },
    BookInfo { code: "1CO", chapter_count: 16 },
    BookInfo { code: "2CO", chapter_count: 13 },
    BookInfo { code: "GAL", chapter_count: 6 },
    BookInfo { code: "EPH", chapter_count: 6 },
    BookInfo { code: "PHP", chapter_count: 4 },
    BookInfo { code: "COL", chapter_count: 4 },
    BookInfo { code: "1TH", chapter_count: 5 },
    BookInfo { code: "2TH", chapter_count: 3 },
    BookInfo { code: "1TI", chapter_count: 6 },
    BookInfo { code: "2TI", chapter_count: 4 },
    BookInfo { code: "TIT", chapter_count: 3 },
    BookInfo { code: "PHM", chapter_count: 1 },
    BookInfo { code: "HEB", chapter_count: 13 },
    BookInfo { code: "JAS", chapter_count: 5 },
    BookInfo { code: "1PE", chapter_count: 5 },
    BookInfo { code: "2PE", chapter_count: 3 },
    BookInfo { code: "1JN", chapter_count: 5 },
    BookInfo { code: "2JN", chapter_count: 1 },
    BookInfo { code: "3JN", chapter_count: 1 },
    BookInfo { code: "JUD", chapter_count: 1 },
    BookInfo { code: "REV", chapter_count: 22 },
];

lazy_static! {
    /// Book code to its 1-based sort index
    static ref BOOK_TO_INDEX: HashMap<&'static str, u32> = {
        let mut map = HashMap::new();
        for (idx, book) in NEW_TESTAMENT_BOOKS.iter().enumerate() {
            map.insert(book.code, idx as u32 + 1);
        }
        map
    };
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortKeyError {
    #[error("book code not in the New Testament table: {0}")]
    UnknownBook(String),
    #[error("chapter {0} does not fit in 8 bits")]
    ChapterOutOfRange(u32),
    #[error("verse {0} does not fit in 8 bits")]
    VerseOutOfRange(u32),
}

pub fn book_index(book_code: &str) -> Option<u32> {
    BOOK_TO_INDEX.get(book_code).copied()
}

pub fn is_known_book(book_code: &str) -> bool {
    BOOK_TO_INDEX.contains_key(book_code)
}

pub fn book_info(book_code: &str) -> Option<&'static BookInfo> {
    book_index(book_code).map(|idx| &NEW_TESTAMENT_BOOKS[idx as usize - 1])
}

pub fn book_code_for_index(index: u32) -> Option<&'static str> {
    if index == 0 {
        return None;
    }
    NEW_TESTAMENT_BOOKS.get(index as usize - 1).map(|b| b.code)
}

/// Packs (book, chapter, verse) as `(bookIndex << 16) | (chapter << 8) | verse`.
pub fn sort_key(book_code: &str, chapter: u32, verse: u32) -> Result<u32, SortKeyError> {
    let idx = book_index(book_code)
        .ok_or_else(|| SortKeyError::UnknownBook(book_code.to_string()))?;
    if chapter > 0xff {
        return Err(SortKeyError::ChapterOutOfRange(chapter));
    }
    if verse > 0xff {
        return Err(SortKeyError::VerseOutOfRange(verse));
    }
    Ok((idx << 16) | (chapter << 8) | verse)
}

/// Inverse of [`sort_key`]: returns (book index, chapter, verse).
pub fn decode_sort_key(key: u32) -> (u32, u32, u32) {
    (key >> 16, (key >> 8) & 0xff, key & 0xff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_book_index_is_one_based() {
        assert_eq!(book_index("MAT"), Some(1));
        assert_eq!(book_index("1CO"), Some(7));
        assert_eq!(book_index("REV"), Some(27));
        assert_eq!(book_index("GEN"), None);
        assert_eq!(book_code_for_index(4), Some("JHN"));
        assert_eq!(book_code_for_index(0), None);
        assert_eq!(book_code_for_index(28), None);
    }

    #[test]
    fn test_sort_key_packing() {
        // JHN = 4
        assert_eq!(sort_key("JHN", 1, 1), Ok((4 << 16) | (1 << 8) | 1));
        assert_eq!(sort_key("MAT", 28, 20), Ok(0x01_1c_14));
    }

    #[test]
    fn test_sort_key_rejects_unknown_book_and_overflow() {
        assert_eq!(sort_key("XYZ", 1, 1), Err(SortKeyError::UnknownBook("XYZ".to_string())));
        assert_eq!(sort_key("MAT", 256, 1), Err(SortKeyError::ChapterOutOfRange(256)));
        assert_eq!(sort_key("MAT", 1, 300), Err(SortKeyError::VerseOutOfRange(300)));
    }

    #[test]
    fn test_sort_key_round_trip() {
        for book in NEW_TESTAMENT_BOOKS.iter() {
            for (chapter, verse) in [(0, 0), (1, 1), (12, 200), (255, 255)] {
                let key = sort_key(book.code, chapter, verse).unwrap();
                let (idx, c, v) = decode_sort_key(key);
                assert_eq!(book_code_for_index(idx), Some(book.code));
                assert_eq!((c, v), (chapter, verse));
            }
        }
    }

    #[test]
    fn test_sort_key_injective_and_ordered() {
        let mut seen = HashSet::new();
        let mut prev = 0;
        for book in NEW_TESTAMENT_BOOKS.iter() {
            for chapter in [1, 2, 100] {
                for verse in [1, 2, 255] {
                    let key = sort_key(book.code, chapter, verse).unwrap();
                    assert!(seen.insert(key), "duplicate key for {} {}:{}", book.code, chapter, verse);
                    assert!(key > prev, "canonical order must be ascending");
                    prev = key;
                }
            }
        }
    }

    #[test]
    fn test_book_info_chapter_counts() {
        assert_eq!(book_info("REV").map(|b| b.chapter_count), Some(22));
        assert_eq!(book_info("PHM").map(|b| b.chapter_count), Some(1));
        assert_eq!(book_info("GEN"), None);
        let total: u32 = NEW_TESTAMENT_BOOKS.iter().map(|b| b.chapter_count).sum();
        assert_eq!(total, 260);
    }
}

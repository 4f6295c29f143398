use diesel::prelude::*;
use crate::db::verses_schema::*;
use crate::types::PersistedRow;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = verses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Verse {
    pub id: i32,
    pub language_code: String,
    pub version: String,
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
    pub verse_text: String,
    pub interleaved_with_strong: String,
    pub interleaved_with_lemma: String,
    pub interleaved_with_content: String,
    pub sort: i32,
}

#[derive(Insertable)]
#[diesel(table_name = verses)]
pub struct NewVerse<'a> {
    pub language_code: &'a str,
    pub version: &'a str,
    pub book: &'a str,
    pub chapter: i32,
    pub verse: i32,
    pub verse_text: &'a str,
    pub interleaved_with_strong: &'a str,
    pub interleaved_with_lemma: &'a str,
    pub interleaved_with_content: &'a str,
    pub sort: i32,
}

impl<'a> From<&'a PersistedRow> for NewVerse<'a> {
    fn from(row: &'a PersistedRow) -> Self {
        NewVerse {
            language_code: &row.language_code,
            version: &row.version,
            book: &row.book,
            chapter: row.chapter as i32,
            verse: row.verse as i32,
            verse_text: &row.verse_text,
            interleaved_with_strong: &row.interleaved_with_strong,
            interleaved_with_lemma: &row.interleaved_with_lemma,
            interleaved_with_content: &row.interleaved_with_content,
            sort: row.sort as i32,
        }
    }
}

impl From<Verse> for PersistedRow {
    fn from(v: Verse) -> Self {
        PersistedRow {
            language_code: v.language_code,
            version: v.version,
            book: v.book,
            chapter: v.chapter as u32,
            verse: v.verse as u32,
            verse_text: v.verse_text,
            interleaved_with_strong: v.interleaved_with_strong,
            interleaved_with_lemma: v.interleaved_with_lemma,
            interleaved_with_content: v.interleaved_with_content,
            sort: v.sort as u32,
        }
    }
}

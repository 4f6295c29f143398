use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::MigrationHarness;
use anyhow::{anyhow, Result};

use crate::db::verses_models::*;
use crate::db::verses_schema::verses;
use crate::db::{DatabaseHandle, VERSES_MIGRATIONS};
use crate::logger;
use crate::types::PersistedRow;
use crate::validation::VerseKeyRow;

pub type VersesDbHandle = DatabaseHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same (language_code, version, book, chapter, verse) exists.
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertCounts {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

fn insert_one(db_conn: &mut SqliteConnection, row: &PersistedRow) -> Result<InsertOutcome, DieselError> {
    let new_verse = NewVerse::from(row);
    match diesel::insert_into(verses::table).values(&new_verse).execute(db_conn) {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(InsertOutcome::Duplicate),
        Err(e) => Err(e),
    }
}

fn row_label(row: &PersistedRow) -> String {
    format!("{}_{} {} {}:{}", row.language_code, row.version, row.book, row.chapter, row.verse)
}

impl VersesDbHandle {
    /// Runs pending schema migrations.
    pub fn initialize(&self) -> Result<()> {
        let _lock = self.write_lock.lock();
        let mut pooled = self.get_conn()?;
        let db_conn: &mut SqliteConnection = &mut pooled;
        db_conn.run_pending_migrations(VERSES_MIGRATIONS)
            .map_err(|e| anyhow!("Failed to execute pending database migrations: {}", e))?;
        Ok(())
    }

    /// Insert-or-fail. A duplicate key is reported, never overwritten.
    pub fn insert_verse(&self, row: &PersistedRow) -> Result<InsertOutcome> {
        self.do_write(|db_conn| insert_one(db_conn, row))
    }

    /// Inserts rows in one transaction. Duplicates and failed rows are
    /// logged and counted; the other rows still go in.
    pub fn insert_rows(&self, rows: &[PersistedRow]) -> Result<InsertCounts> {
        self.do_write(|db_conn| {
            db_conn.transaction::<_, DieselError, _>(|db_conn| {
                let mut counts = InsertCounts::default();

                for row in rows {
                    match insert_one(db_conn, row) {
                        Ok(InsertOutcome::Inserted) => counts.inserted += 1,
                        Ok(InsertOutcome::Duplicate) => {
                            logger::warn(&format!("Duplicate verse not inserted: {}", row_label(row)));
                            counts.duplicates += 1;
                        }
                        Err(e) => {
                            logger::warn(&format!("Failed to insert verse {}: {}", row_label(row), e));
                            counts.failed += 1;
                        }
                    }
                }

                Ok(counts)
            })
        })
    }

    /// Rebuilds the table with rows physically in ascending sort key order.
    ///
    /// Must not run while inserts are in flight. The write lock only guards
    /// this handle.
    pub fn resort(&self) -> Result<()> {
        self.do_write(|db_conn| {
            db_conn.transaction::<_, DieselError, _>(|db_conn| {
                diesel::sql_query("DROP TABLE IF EXISTS verses_sorted").execute(db_conn)?;
                diesel::sql_query(
                    "CREATE TABLE verses_sorted (
                        id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                        language_code TEXT NOT NULL,
                        version TEXT NOT NULL,
                        book TEXT NOT NULL,
                        chapter INTEGER NOT NULL,
                        verse INTEGER NOT NULL,
                        verse_text TEXT NOT NULL,
                        interleaved_with_strong TEXT NOT NULL,
                        interleaved_with_lemma TEXT NOT NULL,
                        interleaved_with_content TEXT NOT NULL,
                        sort INTEGER NOT NULL,
                        UNIQUE (language_code, version, book, chapter, verse)
                    )"
                ).execute(db_conn)?;
                diesel::sql_query(
                    "INSERT INTO verses_sorted (language_code, version, book, chapter, verse, verse_text,
                        interleaved_with_strong, interleaved_with_lemma, interleaved_with_content, sort)
                     SELECT language_code, version, book, chapter, verse, verse_text,
                        interleaved_with_strong, interleaved_with_lemma, interleaved_with_content, sort
                     FROM verses
                     ORDER BY sort, language_code, version"
                ).execute(db_conn)?;
                diesel::sql_query("DROP TABLE verses").execute(db_conn)?;
                diesel::sql_query("ALTER TABLE verses_sorted RENAME TO verses").execute(db_conn)?;
                diesel::sql_query("CREATE INDEX verses_sort_idx ON verses (sort)").execute(db_conn)?;
                Ok(())
            })
        })
    }

    /// (book, chapter, verse, sort) of one corpus, for cross-corpus validation.
    pub fn verse_keys(&self, lang: &str, ver: &str) -> Result<Vec<VerseKeyRow>> {
        use crate::db::verses_schema::verses::dsl;

        let rows: Vec<(String, i32, i32, i32)> = self.do_read(|db_conn| {
            dsl::verses
                .filter(dsl::language_code.eq(lang))
                .filter(dsl::version.eq(ver))
                .select((dsl::book, dsl::chapter, dsl::verse, dsl::sort))
                .order(dsl::id.asc())
                .load(db_conn)
        })?;

        Ok(rows.into_iter()
            .map(|(b, c, v, s)| VerseKeyRow::new(&b, c as u32, v as u32, s as u32))
            .collect())
    }

    /// All rows of one corpus in table order.
    pub fn get_verses(&self, lang: &str, ver: &str) -> Result<Vec<Verse>> {
        use crate::db::verses_schema::verses::dsl;

        self.do_read(|db_conn| {
            dsl::verses
                .filter(dsl::language_code.eq(lang))
                .filter(dsl::version.eq(ver))
                .order(dsl::id.asc())
                .select(Verse::as_select())
                .load(db_conn)
        })
    }

    pub fn get_verse(&self, lang: &str, ver: &str, book_code: &str, chapter_num: u32, verse_num: u32) -> Option<Verse> {
        use crate::db::verses_schema::verses::dsl;

        let result = self.do_read(|db_conn| {
            dsl::verses
                .filter(dsl::language_code.eq(lang))
                .filter(dsl::version.eq(ver))
                .filter(dsl::book.eq(book_code))
                .filter(dsl::chapter.eq(chapter_num as i32))
                .filter(dsl::verse.eq(verse_num as i32))
                .select(Verse::as_select())
                .first(db_conn)
                .optional()
        });

        match result {
            Ok(x) => x,
            Err(e) => {
                logger::error(&format!("get_verse(): {}", e));
                None
            }
        }
    }

    /// Sort keys of all rows in table order, i.e. the order `resort` establishes.
    pub fn sort_keys_in_table_order(&self) -> Result<Vec<u32>> {
        use crate::db::verses_schema::verses::dsl;

        let keys: Vec<i32> = self.do_read(|db_conn| {
            dsl::verses
                .select(dsl::sort)
                .order(dsl::id.asc())
                .load(db_conn)
        })?;
        Ok(keys.into_iter().map(|k| k as u32).collect())
    }

    /// Distinct (language_code, version) pairs present in the table.
    pub fn corpora(&self) -> Result<Vec<(String, String)>> {
        use crate::db::verses_schema::verses::dsl;

        self.do_read(|db_conn| {
            dsl::verses
                .select((dsl::language_code, dsl::version))
                .distinct()
                .order((dsl::language_code.asc(), dsl::version.asc()))
                .load(db_conn)
        })
    }

    pub fn count(&self) -> Result<i64> {
        use crate::db::verses_schema::verses::dsl;

        self.do_read(|db_conn| dsl::verses.count().get_result(db_conn))
    }
}

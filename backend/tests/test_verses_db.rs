use interlinear_backend::book_sort::sort_key;
use interlinear_backend::db::open_verses_db;
use interlinear_backend::db::verses::InsertOutcome;
use interlinear_backend::types::PersistedRow;

fn row(lang: &str, book: &str, chapter: u32, verse: u32, text: &str) -> PersistedRow {
    PersistedRow {
        language_code: lang.to_string(),
        version: "ult".to_string(),
        book: book.to_string(),
        chapter,
        verse,
        verse_text: text.to_string(),
        interleaved_with_strong: format!("{} g0001", text),
        interleaved_with_lemma: format!("{} α", text),
        interleaved_with_content: text.to_string(),
        sort: sort_key(book, chapter, verse).unwrap(),
    }
}

#[test]
fn test_duplicate_insert_is_reported_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_verses_db(&dir.path().join("verses.db")).unwrap();

    let first = row("eng", "JHN", 11, 35, "Jesus wept");
    assert_eq!(db.insert_verse(&first).unwrap(), InsertOutcome::Inserted);

    let second = row("eng", "JHN", 11, 35, "Jesus wept.");
    assert_eq!(db.insert_verse(&second).unwrap(), InsertOutcome::Duplicate);

    assert_eq!(db.count().unwrap(), 1);
    let stored = db.get_verse("eng", "ult", "JHN", 11, 35).unwrap();
    assert_eq!(stored.verse_text, "Jesus wept");

    // Same key in another language is a different row.
    assert_eq!(db.insert_verse(&row("hin", "JHN", 11, 35, "यीशु रोया")).unwrap(), InsertOutcome::Inserted);
}

#[test]
fn test_insert_rows_continues_past_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_verses_db(&dir.path().join("verses.db")).unwrap();

    let rows = vec![
        row("eng", "MRK", 1, 1, "The beginning"),
        row("eng", "MRK", 1, 1, "The beginning again"),
        row("eng", "MRK", 1, 2, "As it is written"),
    ];
    let counts = db.insert_rows(&rows).unwrap();

    assert_eq!(counts.inserted, 2);
    assert_eq!(counts.duplicates, 1);
    assert_eq!(counts.failed, 0);
    assert_eq!(db.count().unwrap(), 2);
}

#[test]
fn test_resort_orders_rows_and_keeps_constraints() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("verses.db");
    let db = open_verses_db(&db_path).unwrap();

    db.insert_rows(&[
        row("eng", "REV", 22, 21, "Amen"),
        row("eng", "MAT", 1, 2, "Abraham"),
        row("eng", "MAT", 1, 1, "The book"),
        row("eng", "ACT", 1, 1, "The former account"),
    ]).unwrap();

    db.resort().unwrap();

    let keys = db.sort_keys_in_table_order().unwrap();
    assert_eq!(keys, vec![
        sort_key("MAT", 1, 1).unwrap(),
        sort_key("MAT", 1, 2).unwrap(),
        sort_key("ACT", 1, 1).unwrap(),
        sort_key("REV", 22, 21).unwrap(),
    ]);

    let books: Vec<String> = db.get_verses("eng", "ult").unwrap().into_iter().map(|v| v.book).collect();
    assert_eq!(books, vec!["MAT", "MAT", "ACT", "REV"]);

    // The rebuilt table still rejects duplicates, also after reopening.
    assert_eq!(db.insert_verse(&row("eng", "MAT", 1, 1, "x")).unwrap(), InsertOutcome::Duplicate);
    drop(db);
    let reopened = open_verses_db(&db_path).unwrap();
    assert_eq!(reopened.count().unwrap(), 4);
    assert_eq!(reopened.corpora().unwrap(), vec![("eng".to_string(), "ult".to_string())]);
}

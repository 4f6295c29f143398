use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use interlinear_backend::config::PipelineConfig;
use interlinear_backend::types::{DocumentEntry, Item};

/// A scratch directory laid out the way the pipeline expects its inputs.
pub struct Fixture {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl Fixture {
    pub fn new() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let config = PipelineConfig {
            documents_dir: root.join("documents"),
            source_corpus_dir: root.join("koine_ugnt"),
            lexicon_dir: root.join("en_gwt"),
            output_dir: root.join("output"),
            database_path: root.join("db").join("alignedData.db"),
            ..Default::default()
        };

        fs::create_dir_all(&config.documents_dir).unwrap();
        fs::create_dir_all(&config.lexicon_dir).unwrap();

        Fixture { dir, config }
    }

    pub fn corpus_dir(&self, name: &str) -> PathBuf {
        self.config.documents_dir.join(name)
    }
}

/// One aligned source word around the given translated words.
pub fn aligned(strong: &str, lemma: &str, content: Option<&str>, words: &[&str]) -> Vec<Item> {
    let mut items = vec![
        Item::start("milestone/zaln"),
        Item::start(format!("attribute/milestone/zaln/x-strong/0/{}", strong)),
        Item::start(format!("attribute/milestone/zaln/x-lemma/0/{}", lemma)),
    ];
    if let Some(c) = content {
        items.push(Item::start(format!("attribute/milestone/zaln/x-content/0/{}", c)));
    }
    for (n, w) in words.iter().enumerate() {
        if n > 0 {
            items.push(Item::line_space());
        }
        items.push(Item::start("spanWithAtts/w"));
        items.push(Item::word(*w));
        items.push(Item::end("spanWithAtts/w"));
    }
    items.push(Item::end("milestone/zaln"));
    items.push(Item::line_space());
    items
}

/// Wraps each verse's items in verse start/end markers, after a chapter start.
pub fn chapter(verses: Vec<Vec<Item>>) -> Vec<Item> {
    let mut items = vec![Item::start("chapter/1")];
    for (n, verse) in verses.into_iter().enumerate() {
        let marker = format!("verse/{}", n + 1);
        items.push(Item::start(marker.clone()));
        items.extend(verse);
        items.push(Item::end(marker));
    }
    items
}

/// Plain source-language verse text, one word item per whitespace token.
pub fn plain_verse(text: &str) -> Vec<Item> {
    let mut items = Vec::new();
    for (n, w) in text.split_whitespace().enumerate() {
        if n > 0 {
            items.push(Item::line_space());
        }
        items.push(Item::word(w));
    }
    items
}

/// Writes `index.json` and one `<document>/<chapter>.json` per chapter.
pub fn write_corpus(corpus_dir: &Path, documents: Vec<(&str, &str, Vec<Vec<Item>>)>) {
    fs::create_dir_all(corpus_dir).unwrap();

    let mut index = Vec::new();
    for (document_id, book_code, chapters) in documents {
        index.push(DocumentEntry {
            document_id: document_id.to_string(),
            book_code: book_code.to_string(),
            chapter_count: chapters.len() as u32,
        });

        let document_dir = corpus_dir.join(document_id);
        fs::create_dir_all(&document_dir).unwrap();
        for (n, items) in chapters.into_iter().enumerate() {
            fs::write(
                document_dir.join(format!("{}.json", n + 1)),
                serde_json::to_string(&items).unwrap(),
            ).unwrap();
        }
    }

    fs::write(corpus_dir.join("index.json"), serde_json::to_string(&index).unwrap()).unwrap();
}

/// A lexical store entry file at `<root>/<bucket>/<identifier>.md`.
#[allow(dead_code)]
pub fn write_lexicon_entry(root: &Path, bucket: &str, identifier: &str, content: &str) {
    let dir = root.join(bucket);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.md", identifier)), content).unwrap();
}

/// John 1:1-2 in a translation and the matching source chapter.
pub fn john_one_translation() -> Vec<Vec<Item>> {
    let mut verse_1 = aligned("G17220", "ἐν", Some("Ἐν"), &["In"]);
    verse_1.extend(aligned("G07460", "ἀρχή", Some("ἀρχῇ"), &["the", "beginning"]));
    verse_1.push(Item::punctuation(","));

    let mut verse_2 = aligned("G37780", "οὗτος", None, &["He"]);
    verse_2.extend(aligned("G15100", "εἰμί", Some("ἦν"), &["was"]));
    verse_2.push(Item::punctuation("."));

    vec![chapter(vec![verse_1, verse_2])]
}

pub fn john_one_source() -> Vec<Vec<Item>> {
    vec![chapter(vec![
        plain_verse("Ἐν ἀρχῇ ἦν ὁ λόγος"),
        plain_verse("οὗτος ἦν ἐν ἀρχῇ πρὸς τὸν θεόν"),
    ])]
}

pub fn matthew_one_translation() -> Vec<Vec<Item>> {
    let mut verse_1 = aligned("G09760", "βίβλος", None, &["The", "book"]);
    verse_1.push(Item::punctuation("."));
    vec![chapter(vec![verse_1])]
}

pub fn matthew_one_source() -> Vec<Vec<Item>> {
    vec![chapter(vec![plain_verse("Βίβλος γενέσεως Ἰησοῦ Χριστοῦ")])]
}

/// `en_ult` with John and Matthew, plus the source corpus with the same verses.
pub fn write_standard_inputs(fixture: &Fixture) {
    write_corpus(&fixture.corpus_dir("en_ult"), vec![
        ("43-JHN", "JHN", john_one_translation()),
        ("41-MAT", "MAT", matthew_one_translation()),
    ]);
    write_corpus(&fixture.config.source_corpus_dir, vec![
        ("43-JHN", "JHN", john_one_source()),
        ("41-MAT", "MAT", matthew_one_source()),
    ]);
}

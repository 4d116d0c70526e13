use lexsearch_core::persist::{load_doc_urls, load_meta, load_snapshot, save_doc_urls, save_meta, save_snapshot, IndexPaths};
use lexsearch_core::{build_snapshot, Document, IndexError, QueryService, Tokenizer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn corpus(texts: &[&str]) -> Vec<Document> {
    texts.iter().enumerate().map(|(i, t)| Document::new(i as u32, *t)).collect()
}

fn build_and_save(dir: &std::path::Path, texts: &[&str]) -> IndexPaths {
    let paths = IndexPaths::new(dir);
    let snap = build_snapshot(&corpus(texts), &Tokenizer::english()).unwrap();
    save_snapshot(&paths, &snap).unwrap();
    paths
}

#[test]
fn round_trip_answers_identically() {
    let dir = tempdir().unwrap();
    let docs = corpus(&["rust systems language", "python scripting language", "rust belt towns"]);
    let built = Arc::new(build_snapshot(&docs, &Tokenizer::english()).unwrap());
    let paths = IndexPaths::new(dir.path());
    save_snapshot(&paths, &built).unwrap();
    let loaded = Arc::new(load_snapshot(&paths).unwrap());

    assert_eq!(loaded.meta(), built.meta());
    assert_eq!(loaded.vectorizer(), built.vectorizer());
    assert_eq!(loaded.matrix(), built.matrix());
    assert_eq!(loaded.inverted_index(), built.inverted_index());

    let a = QueryService::new(built);
    let b = QueryService::new(loaded);
    for q in ["rust", "language", "scripting rust"] {
        assert_eq!(a.answer(Some(q)).unwrap(), b.answer(Some(q)).unwrap());
    }
}

#[test]
fn stopwords_travel_with_the_snapshot() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let tokenizer = Tokenizer::new(["rust"]);
    let snap = build_snapshot(&corpus(&["rust systems", "rust belt"]), &tokenizer).unwrap();
    save_snapshot(&paths, &snap).unwrap();
    let loaded = load_snapshot(&paths).unwrap();
    assert_eq!(loaded.tokenizer(), &tokenizer);
    assert!(QueryService::new(Arc::new(loaded)).answer(Some("rust")).unwrap().is_empty());
}

#[test]
fn each_missing_artifact_fails_the_load() {
    for name in ["vectorizer.bin", "matrix.bin", "inverted_index.bin", "meta.json"] {
        let dir = tempdir().unwrap();
        let paths = build_and_save(dir.path(), &["cat dog", "dog bird"]);
        fs::remove_file(dir.path().join(name)).unwrap();
        match load_snapshot(&paths) {
            Err(IndexError::MissingArtifact(p)) => assert!(p.ends_with(name)),
            other => panic!("expected MissingArtifact for {name}, got {other:?}"),
        }
    }
}

#[test]
fn corrupted_artifact_fails_the_load() {
    let dir = tempdir().unwrap();
    let paths = build_and_save(dir.path(), &["cat dog", "dog bird"]);
    let mut bytes = fs::read(paths.matrix()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(paths.matrix(), bytes).unwrap();
    assert!(matches!(load_snapshot(&paths), Err(IndexError::Corrupt { .. })));
}

#[test]
fn artifacts_from_different_builds_are_rejected() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    let paths_a = build_and_save(a.path(), &["cat dog", "dog bird"]);
    let paths_b = build_and_save(b.path(), &["cat dog", "dog bird"]);

    // Same corpus, different build: swap in B's matrix and patch the checksum
    // so only the snapshot id differs.
    fs::copy(paths_b.matrix(), paths_a.matrix()).unwrap();
    let mut meta = load_meta(&paths_a).unwrap();
    meta.checksums.matrix = load_meta(&paths_b).unwrap().checksums.matrix;
    save_meta(&paths_a, &meta).unwrap();

    assert!(matches!(load_snapshot(&paths_a), Err(IndexError::SnapshotMismatch { .. })));
}

// Same field layout as the vectorizer artifact, free to hold bad values.
#[derive(Serialize)]
struct RawVectorizer {
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    min_term_len: usize,
}

#[derive(Serialize)]
struct RawModel {
    tokenizer: Vec<String>,
    vectorizer: RawVectorizer,
}

#[derive(Serialize)]
struct RawArtifact {
    snapshot_id: String,
    payload: RawModel,
}

fn replace_vectorizer(paths: &IndexPaths, vocabulary: &[&str], idf: Vec<f32>) {
    let mut meta = load_meta(paths).unwrap();
    let artifact = RawArtifact {
        snapshot_id: meta.snapshot.snapshot_id.clone(),
        payload: RawModel {
            tokenizer: Vec::new(),
            vectorizer: RawVectorizer {
                vocabulary: vocabulary.iter().map(|t| t.to_string()).collect(),
                idf,
                min_term_len: 2,
            },
        },
    };
    let bytes = bincode::serialize(&artifact).unwrap();
    meta.checksums.vectorizer = crc32fast::hash(&bytes);
    fs::write(paths.vectorizer(), bytes).unwrap();
    save_meta(paths, &meta).unwrap();
}

#[test]
fn idf_shorter_than_vocabulary_is_rejected() {
    let dir = tempdir().unwrap();
    let paths = build_and_save(dir.path(), &["cat dog", "dog bird"]);
    replace_vectorizer(&paths, &["bird", "cat", "dog"], vec![1.0]);
    assert!(matches!(load_snapshot(&paths), Err(IndexError::Inconsistent(_))));
}

#[test]
fn unordered_vocabulary_is_rejected() {
    let dir = tempdir().unwrap();
    let paths = build_and_save(dir.path(), &["cat dog", "dog bird"]);
    replace_vectorizer(&paths, &["dog", "cat", "bird"], vec![1.0, 1.0, 1.0]);
    assert!(matches!(load_snapshot(&paths), Err(IndexError::Inconsistent(_))));
}

#[test]
fn failed_save_keeps_previous_snapshot() {
    let dir = tempdir().unwrap();
    let paths = build_and_save(dir.path(), &["cat dog", "dog bird"]);
    let before = load_meta(&paths).unwrap();

    // A directory squatting on the staging name makes the matrix write fail.
    fs::create_dir(dir.path().join("matrix.bin.tmp")).unwrap();
    let next = build_snapshot(&corpus(&["fish tank", "bird cage"]), &Tokenizer::english()).unwrap();
    assert!(save_snapshot(&paths, &next).is_err());

    let loaded = load_snapshot(&paths).unwrap();
    assert_eq!(loaded.meta(), &before.snapshot);
    assert!(loaded.vectorizer().vocabulary().get("fish").is_none());
    assert!(!dir.path().join("vectorizer.bin.tmp").exists());
}

#[test]
fn save_leaves_no_staging_files() {
    let dir = tempdir().unwrap();
    build_and_save(dir.path(), &["cat dog"]);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn unknown_format_version_is_rejected() {
    let dir = tempdir().unwrap();
    let paths = build_and_save(dir.path(), &["cat dog"]);
    let mut meta = load_meta(&paths).unwrap();
    meta.snapshot.version = 99;
    save_meta(&paths, &meta).unwrap();
    assert!(matches!(load_snapshot(&paths), Err(IndexError::UnsupportedVersion(99))));
}

#[test]
fn doc_urls_round_trip() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let urls: BTreeMap<u32, String> = [(0, "https://example.com/a".to_string()), (3, "https://example.com/b".to_string())].into();
    save_doc_urls(&paths, &urls).unwrap();
    assert_eq!(load_doc_urls(&paths).unwrap(), urls);
}

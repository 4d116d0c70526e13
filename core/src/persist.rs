use crate::config::FORMAT_VERSION;
use crate::error::IndexError;
use crate::index::InvertedIndex;
use crate::matrix::DocumentMatrix;
use crate::service::{Snapshot, SnapshotMeta};
use crate::tokenizer::Tokenizer;
use crate::vectorizer::Vectorizer;
use crate::DocId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Snapshot manifest, written last. Records the snapshot id every artifact
/// must carry and the crc32 of each artifact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    #[serde(flatten)]
    pub snapshot: SnapshotMeta,
    pub checksums: Checksums,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checksums {
    pub vectorizer: u32,
    pub matrix: u32,
    pub inverted_index: u32,
}

#[derive(Serialize)]
struct ArtifactRef<'a, T> {
    snapshot_id: &'a str,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Artifact<T> {
    snapshot_id: String,
    payload: T,
}

#[derive(Serialize, Deserialize)]
struct Model {
    tokenizer: Tokenizer,
    vectorizer: Vectorizer,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn vectorizer(&self) -> PathBuf { self.root.join("vectorizer.bin") }
    pub fn matrix(&self) -> PathBuf { self.root.join("matrix.bin") }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.json") }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> IndexError + '_ {
    move |source| {
        if source.kind() == ErrorKind::NotFound {
            IndexError::MissingArtifact(path.to_path_buf())
        } else {
            IndexError::Io { path: path.to_path_buf(), source }
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let mut f = File::create(path).map_err(io_error(path))?;
    f.write_all(bytes).map_err(io_error(path))?;
    f.sync_all().map_err(io_error(path))?;
    Ok(())
}

fn encode_artifact<T: Serialize>(name: &'static str, snapshot_id: &str, payload: &T) -> Result<Vec<u8>, IndexError> {
    bincode::serialize(&ArtifactRef { snapshot_id, payload }).map_err(|e| IndexError::Encode { name, reason: e.to_string() })
}

/// Sibling path a file is written to before being renamed over `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write every file under its staging name, then rename each into place in
/// order. If staging fails, the staged files are removed and the files
/// already in place are left untouched.
fn write_staged(files: &[(PathBuf, Vec<u8>)]) -> Result<(), IndexError> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (path, bytes) in files {
        let tmp = staging_path(path);
        if let Err(e) = write_file(&tmp, bytes) {
            for p in staged.iter().chain(std::iter::once(&tmp)) {
                let _ = std::fs::remove_file(p);
            }
            return Err(e);
        }
        staged.push(tmp);
    }
    for ((path, _), tmp) in files.iter().zip(&staged) {
        std::fs::rename(tmp, path).map_err(io_error(path))?;
    }
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path, snapshot_id: &str, expected_crc: u32) -> Result<T, IndexError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let found = crc32fast::hash(&bytes);
    if found != expected_crc {
        return Err(IndexError::Corrupt { path: path.to_path_buf(), expected: expected_crc, found });
    }
    let artifact: Artifact<T> = bincode::deserialize(&bytes)
        .map_err(|e| IndexError::Decode { path: path.to_path_buf(), reason: e.to_string() })?;
    if artifact.snapshot_id != snapshot_id {
        return Err(IndexError::SnapshotMismatch {
            path: path.to_path_buf(),
            expected: snapshot_id.to_string(),
            found: artifact.snapshot_id,
        });
    }
    Ok(artifact.payload)
}

/// Encode everything in memory, stage it next to the live files, then rename
/// the three artifacts and finally the manifest into place. A failed save
/// leaves the previous snapshot loadable.
pub fn save_snapshot(paths: &IndexPaths, snapshot: &Snapshot) -> Result<MetaFile, IndexError> {
    create_dir_all(&paths.root).map_err(io_error(&paths.root))?;
    let id = snapshot.meta().snapshot_id.as_str();
    let model = Model { tokenizer: snapshot.tokenizer().clone(), vectorizer: snapshot.vectorizer().clone() };
    let vectorizer = encode_artifact("vectorizer", id, &model)?;
    let matrix = encode_artifact("matrix", id, snapshot.matrix())?;
    let inverted_index = encode_artifact("inverted_index", id, snapshot.inverted_index())?;
    let meta = MetaFile {
        snapshot: snapshot.meta().clone(),
        checksums: Checksums {
            vectorizer: crc32fast::hash(&vectorizer),
            matrix: crc32fast::hash(&matrix),
            inverted_index: crc32fast::hash(&inverted_index),
        },
    };
    let manifest = encode_meta(&meta)?;
    write_staged(&[
        (paths.vectorizer(), vectorizer),
        (paths.matrix(), matrix),
        (paths.inverted_index(), inverted_index),
        (paths.meta(), manifest),
    ])?;
    tracing::info!(root = %paths.root.display(), snapshot = %id, "saved index snapshot");
    Ok(meta)
}

/// Load all three artifacts as one snapshot. Any missing, corrupt, or
/// foreign artifact fails the whole load.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Snapshot, IndexError> {
    let meta = load_meta(paths)?;
    if meta.snapshot.version != FORMAT_VERSION {
        return Err(IndexError::UnsupportedVersion(meta.snapshot.version));
    }
    let id = meta.snapshot.snapshot_id.as_str();
    let model: Model = read_artifact(&paths.vectorizer(), id, meta.checksums.vectorizer)?;
    let matrix: DocumentMatrix = read_artifact(&paths.matrix(), id, meta.checksums.matrix)?;
    let inverted_index: InvertedIndex = read_artifact(&paths.inverted_index(), id, meta.checksums.inverted_index)?;
    let snapshot = Snapshot::assemble(meta.snapshot, model.tokenizer, model.vectorizer, matrix, inverted_index)?;
    tracing::info!(
        root = %paths.root.display(),
        snapshot = %snapshot.meta().snapshot_id,
        num_docs = snapshot.meta().num_docs,
        num_terms = snapshot.meta().num_terms,
        "loaded index snapshot"
    );
    Ok(snapshot)
}

fn encode_meta(meta: &MetaFile) -> Result<Vec<u8>, IndexError> {
    serde_json::to_vec_pretty(meta).map_err(|e| IndexError::Encode { name: "meta", reason: e.to_string() })
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), IndexError> {
    write_file(&paths.meta(), &encode_meta(meta)?)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, IndexError> {
    let path = paths.meta();
    let buf = std::fs::read_to_string(&path).map_err(io_error(&path))?;
    serde_json::from_str(&buf).map_err(|e| IndexError::Decode { path, reason: e.to_string() })
}

/// Display metadata (doc id -> source url). Not part of the snapshot.
pub fn save_doc_urls(paths: &IndexPaths, urls: &BTreeMap<DocId, String>) -> Result<(), IndexError> {
    let path = paths.docs();
    let json = serde_json::to_string_pretty(urls).map_err(|e| IndexError::Encode { name: "docs", reason: e.to_string() })?;
    write_file(&path, json.as_bytes())
}

pub fn load_doc_urls(paths: &IndexPaths) -> Result<BTreeMap<DocId, String>, IndexError> {
    let path = paths.docs();
    let buf = std::fs::read_to_string(&path).map_err(io_error(&path))?;
    serde_json::from_str(&buf).map_err(|e| IndexError::Decode { path, reason: e.to_string() })
}

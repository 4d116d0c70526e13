use crate::config::MIN_TERM_LEN;
use crate::error::IndexError;
use crate::index::build_inverted_index;
use crate::service::{Snapshot, SnapshotMeta};
use crate::tokenizer::Tokenizer;
use crate::vectorizer::Vectorizer;
use crate::DocId;
use serde::{Deserialize, Serialize};

/// One raw corpus record. Only its id survives vectorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub raw_text: String,
}

impl Document {
    pub fn new(id: DocId, raw_text: impl Into<String>) -> Self {
        Self { id, raw_text: raw_text.into() }
    }
}

/// Run the offline pipeline: tokenize every document, fit the vectorizer,
/// derive the inverted index and stamp a fresh snapshot id.
pub fn build_snapshot(docs: &[Document], tokenizer: &Tokenizer) -> Result<Snapshot, IndexError> {
    build_snapshot_with(docs, tokenizer, MIN_TERM_LEN)
}

pub fn build_snapshot_with(docs: &[Document], tokenizer: &Tokenizer, min_term_len: usize) -> Result<Snapshot, IndexError> {
    let corpus: Vec<(DocId, Vec<String>)> = docs
        .iter()
        .map(|d| (d.id, tokenizer.tokenize(&d.raw_text)))
        .collect();
    let (vectorizer, matrix) = Vectorizer::fit_with(&corpus, min_term_len)?;
    let inverted_index = build_inverted_index(&matrix, vectorizer.vocabulary());
    let meta = SnapshotMeta::stamp(matrix.num_docs(), vectorizer.dims());
    tracing::info!(
        num_docs = meta.num_docs,
        num_terms = meta.num_terms,
        nnz = matrix.nnz(),
        snapshot = %meta.snapshot_id,
        "built index snapshot"
    );
    Snapshot::assemble(meta, tokenizer.clone(), vectorizer, matrix, inverted_index)
}

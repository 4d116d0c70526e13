use crate::config::{FORMAT_VERSION, QUERY_PATTERN, TOP_K};
use crate::error::{IndexError, QueryError, ValidationError};
use crate::index::{check_consistency, InvertedIndex};
use crate::matrix::DocumentMatrix;
use crate::ranker::{rank, RankedResult};
use crate::tokenizer::Tokenizer;
use crate::vectorizer::Vectorizer;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;

lazy_static! {
    static ref QUERY_RE: Regex = Regex::new(QUERY_PATTERN).expect("valid regex");
}

/// Identity of one built corpus snapshot. Every persisted artifact carries
/// the same `snapshot_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub version: u32,
    pub snapshot_id: String,
    pub created_at: String,
    pub num_docs: u32,
    pub num_terms: u32,
}

impl SnapshotMeta {
    pub(crate) fn stamp(num_docs: usize, num_terms: usize) -> Self {
        Self {
            version: FORMAT_VERSION,
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            num_docs: num_docs as u32,
            num_terms: num_terms as u32,
        }
    }
}

/// Everything a query needs, frozen after build or load. Constructed only
/// through [`Snapshot::assemble`], which validates the vectorizer and checks
/// postings against the matrix.
#[derive(Debug)]
pub struct Snapshot {
    meta: SnapshotMeta,
    tokenizer: Tokenizer,
    vectorizer: Vectorizer,
    matrix: DocumentMatrix,
    inverted_index: InvertedIndex,
}

impl Snapshot {
    pub fn assemble(
        meta: SnapshotMeta,
        tokenizer: Tokenizer,
        vectorizer: Vectorizer,
        matrix: DocumentMatrix,
        inverted_index: InvertedIndex,
    ) -> Result<Self, IndexError> {
        vectorizer.validate()?;
        check_consistency(&inverted_index, &matrix, vectorizer.vocabulary())?;
        Ok(Self { meta, tokenizer, vectorizer, matrix, inverted_index })
    }

    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn matrix(&self) -> &DocumentMatrix {
        &self.matrix
    }

    pub fn inverted_index(&self) -> &InvertedIndex {
        &self.inverted_index
    }
}

/// Read-only query front end over a shared snapshot. Cheap to clone and safe
/// to call from any number of threads.
#[derive(Debug, Clone)]
pub struct QueryService {
    snapshot: Arc<Snapshot>,
    top_k: usize,
}

impl QueryService {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot, top_k: TOP_K }
    }

    /// Lower the result cap. Values above [`TOP_K`] are clamped to it.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.min(TOP_K);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Validate, tokenize, project and rank. An empty list means the query was
    /// fine but nothing matched.
    pub fn answer(&self, query: Option<&str>) -> Result<Vec<RankedResult>, QueryError> {
        let text = validate_query(query).map_err(|e| {
            tracing::debug!(error = %e, "query rejected");
            e
        })?;
        let tokens = self.snapshot.tokenizer.tokenize(text);
        let query_vector = self.snapshot.vectorizer.transform(&tokens);
        if query_vector.is_zero() {
            tracing::debug!(terms = tokens.len(), "query has no in-vocabulary terms");
        }
        rank(&query_vector, &self.snapshot.matrix, self.top_k).map_err(|e| {
            tracing::error!(error = %e, snapshot = %self.snapshot.meta.snapshot_id, "ranking failed");
            e
        })
    }
}

/// Reject absent, blank, or non-alphanumeric input before it reaches the
/// pipeline.
pub fn validate_query(query: Option<&str>) -> Result<&str, ValidationError> {
    let q = query.ok_or(ValidationError::Missing)?;
    if q.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if !QUERY_RE.is_match(q) {
        return Err(ValidationError::IllegalCharacters);
    }
    Ok(q)
}

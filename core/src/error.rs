use crate::DocId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while building a snapshot or loading one from disk. Any of these
/// is fatal at startup: a process that hits one must not serve queries.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("corpus produced an empty vocabulary")]
    EmptyVocabulary,

    #[error("document id {0} appears more than once")]
    DuplicateDocument(DocId),

    #[error("missing index artifact {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("failed to encode {name}: {reason}")]
    Encode { name: &'static str, reason: String },

    #[error("checksum mismatch on {} (expected {expected:08x}, found {found:08x})", path.display())]
    Corrupt { path: PathBuf, expected: u32, found: u32 },

    #[error("artifact {} belongs to snapshot {found}, manifest says {expected}", path.display())]
    SnapshotMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("unsupported index format version {0}")]
    UnsupportedVersion(u32),

    #[error("inverted index disagrees with document matrix: {0}")]
    Inconsistent(String),
}

/// Why a query string was refused before reaching the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing query")]
    Missing,
    #[error("empty query")]
    Empty,
    #[error("query contains illegal characters")]
    IllegalCharacters,
}

/// Outcome of a failed `answer` call. A query that matches nothing is not an
/// error; it is an empty result list.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    Validation(#[from] ValidationError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn is_validation(&self) -> bool {
        matches!(self, QueryError::Validation(_))
    }
}

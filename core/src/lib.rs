pub mod builder;
pub mod config;
pub mod error;
pub mod index;
pub mod matrix;
pub mod persist;
pub mod ranker;
pub mod service;
pub mod tokenizer;
pub mod vectorizer;

pub use builder::{build_snapshot, Document};
pub use error::{IndexError, QueryError, ValidationError};
pub use index::{build_inverted_index, InvertedIndex, Posting};
pub use matrix::{DocumentMatrix, SparseVector};
pub use ranker::{rank, RankedResult};
pub use service::{QueryService, Snapshot};
pub use tokenizer::Tokenizer;
pub use vectorizer::{Vectorizer, Vocabulary};

pub type TermId = u32;
pub type DocId = u32;

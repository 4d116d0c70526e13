//! Engine-wide constants. Runtime settings live in the `indexer` and `server`
//! command lines.

/// Number of results returned per query.
pub const TOP_K: usize = 5;

/// Shortest term (in chars) the vectorizer keeps. Single-character tokens
/// survive tokenization but never become vocabulary dimensions.
pub const MIN_TERM_LEN: usize = 2;

/// Allow-list applied to raw query text before tokenization.
pub const QUERY_PATTERN: &str = r"^[a-zA-Z0-9 ]+$";

/// On-disk snapshot format. Bump when any persisted type changes shape.
pub const FORMAT_VERSION: u32 = 1;

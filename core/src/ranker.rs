use crate::error::QueryError;
use crate::matrix::{DocumentMatrix, SparseVector};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub doc_id: DocId,
    pub score: f32,
}

/// Score `query` against every matrix row by cosine similarity and return at
/// most `k` positive hits, best first, ties broken by ascending doc id.
///
/// Query and rows are unit vectors (or zero), so cosine reduces to a dot
/// product. Scores are clamped to 1.0 to absorb rounding on identical vectors.
pub fn rank(query: &SparseVector, matrix: &DocumentMatrix, k: usize) -> Result<Vec<RankedResult>, QueryError> {
    if query.is_zero() || k == 0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<RankedResult> = Vec::new();
    for (doc_id, row) in matrix.iter() {
        let score = query.dot(row);
        if !score.is_finite() {
            return Err(QueryError::Internal(format!("non-finite similarity for doc {doc_id}")));
        }
        if score > 0.0 {
            scored.push(RankedResult { doc_id, score: score.min(1.0) });
        }
    }

    scored.sort_by(compare);
    scored.truncate(k);
    Ok(scored)
}

fn compare(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

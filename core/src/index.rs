use crate::error::IndexError;
use crate::matrix::DocumentMatrix;
use crate::vectorizer::Vocabulary;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // normalized tf-idf weight
}

/// Term -> postings, derived from the document matrix. Ranking scores the
/// matrix directly; postings serve term-level lookups and must agree with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<Posting>>, // postings sorted by doc_id
}

impl InvertedIndex {
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Posting])> + '_ {
        self.postings.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }
}

/// Emit one postings list per vocabulary term holding every document with a
/// non-zero weight on it, in doc id order.
pub fn build_inverted_index(matrix: &DocumentMatrix, vocabulary: &Vocabulary) -> InvertedIndex {
    let mut by_term: Vec<Vec<Posting>> = vec![Vec::new(); vocabulary.len()];
    // matrix rows iterate in doc id order, so each list comes out sorted
    for (doc_id, row) in matrix.iter() {
        for (tid, weight) in row.iter() {
            if let Some(list) = by_term.get_mut(tid as usize) {
                list.push(Posting { doc_id, weight });
            }
        }
    }
    let postings = vocabulary
        .iter()
        .zip(by_term)
        .filter(|(_, list)| !list.is_empty())
        .map(|((_, term), list)| (term.to_string(), list))
        .collect();
    InvertedIndex { postings }
}

/// Verify that postings and matrix describe the same non-zero entries with
/// identical weights.
pub fn check_consistency(index: &InvertedIndex, matrix: &DocumentMatrix, vocabulary: &Vocabulary) -> Result<(), IndexError> {
    if matrix.dims() != vocabulary.len() {
        return Err(IndexError::Inconsistent(format!(
            "matrix has {} columns but vocabulary has {} terms",
            matrix.dims(),
            vocabulary.len()
        )));
    }

    let mut postings_seen = 0usize;
    for (term, list) in index.iter() {
        let tid = vocabulary
            .get(term)
            .ok_or_else(|| IndexError::Inconsistent(format!("term {term:?} is not in the vocabulary")))?;
        if list.windows(2).any(|w| w[0].doc_id >= w[1].doc_id) {
            return Err(IndexError::Inconsistent(format!("postings for {term:?} are not in doc id order")));
        }
        for p in list {
            let entry = matrix.get(p.doc_id, tid);
            if entry == 0.0 || entry.to_bits() != p.weight.to_bits() {
                return Err(IndexError::Inconsistent(format!(
                    "posting ({term:?}, doc {}) has weight {} but matrix has {}",
                    p.doc_id, p.weight, entry
                )));
            }
        }
        postings_seen += list.len();
    }

    // every posting matched a distinct non-zero entry; equal counts mean none are missing
    if postings_seen != matrix.nnz() {
        return Err(IndexError::Inconsistent(format!(
            "{} postings for {} non-zero matrix entries",
            postings_seen,
            matrix.nnz()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SparseVector;
    use crate::vectorizer::Vectorizer;

    fn fitted() -> (Vectorizer, DocumentMatrix) {
        let corpus: Vec<(DocId, Vec<String>)> = ["cat dog", "dog bird", "bird fish"]
            .iter()
            .enumerate()
            .map(|(i, d)| (i as DocId, d.split_whitespace().map(str::to_string).collect()))
            .collect();
        Vectorizer::fit(&corpus).unwrap()
    }

    #[test]
    fn postings_follow_matrix() {
        let (v, m) = fitted();
        let idx = build_inverted_index(&m, v.vocabulary());
        assert_eq!(idx.num_terms(), 4);

        let dog = idx.postings("dog").unwrap();
        let ids: Vec<DocId> = dog.iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![0, 1]);
        let tid = v.vocabulary().get("dog").unwrap();
        for p in dog {
            assert_eq!(p.weight, m.get(p.doc_id, tid));
        }
        assert!(idx.postings("zebra").is_none());
    }

    #[test]
    fn built_index_is_consistent() {
        let (v, m) = fitted();
        let idx = build_inverted_index(&m, v.vocabulary());
        check_consistency(&idx, &m, v.vocabulary()).unwrap();
    }

    #[test]
    fn tampered_weight_is_detected() {
        let (v, m) = fitted();
        let mut idx = build_inverted_index(&m, v.vocabulary());
        idx.postings.get_mut("cat").unwrap()[0].weight += 0.1;
        assert!(matches!(check_consistency(&idx, &m, v.vocabulary()), Err(IndexError::Inconsistent(_))));
    }

    #[test]
    fn missing_posting_is_detected() {
        let (v, m) = fitted();
        let mut idx = build_inverted_index(&m, v.vocabulary());
        idx.postings.remove("fish");
        assert!(check_consistency(&idx, &m, v.vocabulary()).is_err());
    }

    #[test]
    fn foreign_matrix_is_detected() {
        let (v, m) = fitted();
        let idx = build_inverted_index(&m, v.vocabulary());
        let other = DocumentMatrix::new(4, vec![(0, SparseVector::from_pairs([(1, 1.0)]))]);
        assert!(check_consistency(&idx, &other, v.vocabulary()).is_err());
    }
}

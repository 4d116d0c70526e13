use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sparse weight vector over vocabulary dimensions. Entries are sorted by
/// term id and never hold a zero weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unordered `(term, weight)` pairs. Zero weights are dropped;
    /// repeated terms are summed.
    pub fn from_pairs<I: IntoIterator<Item = (TermId, f32)>>(pairs: I) -> Self {
        let mut entries: Vec<(TermId, f32)> = pairs.into_iter().collect();
        entries.sort_by_key(|(t, _)| *t);
        let mut merged: Vec<(TermId, f32)> = Vec::with_capacity(entries.len());
        for (t, w) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == t => *acc += w,
                _ => merged.push((t, w)),
            }
        }
        merged.retain(|(_, w)| *w != 0.0);
        Self { entries: merged }
    }

    pub fn get(&self, term: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&term, |(t, _)| *t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Scale to unit length. The zero vector stays zero.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm == 0.0 {
            return;
        }
        for (_, w) in self.entries.iter_mut() {
            *w /= norm;
        }
    }

    /// Dot product, merge-joining the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Rows are document vectors keyed by doc id, columns are vocabulary
/// dimensions. Rows are kept in ascending doc id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatrix {
    dims: usize,
    rows: Vec<(DocId, SparseVector)>,
}

impl DocumentMatrix {
    pub fn new(dims: usize, mut rows: Vec<(DocId, SparseVector)>) -> Self {
        rows.sort_by_key(|(id, _)| *id);
        Self { dims, rows }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn num_docs(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, doc_id: DocId) -> Option<&SparseVector> {
        self.rows
            .binary_search_by_key(&doc_id, |(id, _)| *id)
            .ok()
            .map(|i| &self.rows[i].1)
    }

    pub fn get(&self, doc_id: DocId, term: TermId) -> f32 {
        self.row(doc_id).map(|r| r.get(term)).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &SparseVector)> + '_ {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|(_, r)| r.nnz()).sum()
    }
}

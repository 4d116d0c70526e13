use crate::config::MIN_TERM_LEN;
use crate::error::IndexError;
use crate::matrix::{DocumentMatrix, SparseVector};
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Closed mapping from term to dimension. Ids follow lexicographic term
/// order, so the same corpus always yields the same vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    fn from_sorted(terms: Vec<String>) -> Self {
        let ids = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId))
            .collect();
        Self { terms, ids }
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms with their ids, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &str)> + '_ {
        self.terms.iter().enumerate().map(|(i, t)| (i as TermId, t.as_str()))
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        Self::from_sorted(terms)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(v: Vocabulary) -> Self {
        v.terms
    }
}

/// Frozen TF-IDF model: the vocabulary learned at build time and one IDF
/// weight per dimension. `transform` never grows or refits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vectorizer {
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    min_term_len: usize,
}

impl Vectorizer {
    /// Fit on a tokenized corpus and return the frozen vectorizer together
    /// with the L2-normalized document matrix.
    pub fn fit(corpus: &[(DocId, Vec<String>)]) -> Result<(Self, DocumentMatrix), IndexError> {
        Self::fit_with(corpus, MIN_TERM_LEN)
    }

    pub fn fit_with(corpus: &[(DocId, Vec<String>)], min_term_len: usize) -> Result<(Self, DocumentMatrix), IndexError> {
        let mut seen_ids: HashSet<DocId> = HashSet::with_capacity(corpus.len());
        for (id, _) in corpus {
            if !seen_ids.insert(*id) {
                return Err(IndexError::DuplicateDocument(*id));
            }
        }

        let mut terms: BTreeSet<&str> = BTreeSet::new();
        for (_, tokens) in corpus {
            terms.extend(analyze(tokens, min_term_len));
        }
        if terms.is_empty() {
            return Err(IndexError::EmptyVocabulary);
        }
        let vocabulary = Vocabulary::from_sorted(terms.into_iter().map(str::to_string).collect());

        // df: number of documents containing each term
        let mut df = vec![0u32; vocabulary.len()];
        for (_, tokens) in corpus {
            let distinct: HashSet<TermId> = analyze(tokens, min_term_len)
                .filter_map(|t| vocabulary.get(t))
                .collect();
            for tid in distinct {
                df[tid as usize] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = df
            .iter()
            .map(|&d| (((1.0 + n) / (1.0 + d as f64)).ln() + 1.0) as f32)
            .collect();

        let vectorizer = Self { vocabulary, idf, min_term_len };
        let rows = corpus
            .iter()
            .map(|(id, tokens)| (*id, vectorizer.transform(tokens)))
            .collect();
        let matrix = DocumentMatrix::new(vectorizer.vocabulary.len(), rows);
        Ok((vectorizer, matrix))
    }

    /// Project a token sequence into the fitted space: raw counts of in-vocabulary
    /// terms times their IDF, L2-normalized. Unknown terms contribute nothing.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for term in analyze(tokens, self.min_term_len) {
            if let Some(tid) = self.vocabulary.get(term) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        let mut v = SparseVector::from_pairs(
            counts
                .into_iter()
                .map(|(tid, tf)| (tid, tf as f32 * self.idf[tid as usize])),
        );
        v.normalize();
        v
    }

    /// Check a deserialized vectorizer before it is served: one finite,
    /// positive IDF per term and terms in strictly ascending order.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(IndexError::Inconsistent(format!(
                "{} idf weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }
        if let Some((tid, w)) = self.idf.iter().enumerate().find(|(_, w)| !w.is_finite() || **w <= 0.0) {
            return Err(IndexError::Inconsistent(format!("idf of term {tid} is {w}")));
        }
        if let Some(pair) = self.vocabulary.terms.windows(2).find(|w| w[0] >= w[1]) {
            return Err(IndexError::Inconsistent(format!(
                "vocabulary terms {:?} and {:?} are out of order",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|tid| self.idf[tid as usize])
    }

    pub fn dims(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn min_term_len(&self) -> usize {
        self.min_term_len
    }
}

/// Equivalent to joining the tokens with spaces and re-splitting, keeping
/// only terms of at least `min_term_len` chars.
fn analyze<'a>(tokens: &'a [String], min_term_len: usize) -> impl Iterator<Item = &'a str> + 'a {
    tokens
        .iter()
        .flat_map(|t| t.split_whitespace())
        .filter(move |t| t.chars().count() >= min_term_len)
}

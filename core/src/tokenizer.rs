use crate::error::IndexError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
    // Punctuation is stripped before stopword filtering, so contractions such
    // as "don't" can never match and only bare words are listed.
    static ref ENGLISH_STOPWORDS: Arc<HashSet<String>> = {
        let words: &[&str] = &[
            "i","me","my","myself","we","our","ours","ourselves","you","your","yours","yourself","yourselves",
            "he","him","his","himself","she","her","hers","herself","it","its","itself",
            "they","them","their","theirs","themselves","what","which","who","whom","this","that","these","those",
            "am","is","are","was","were","be","been","being","have","has","had","having","do","does","did","doing",
            "a","an","the","and","but","if","or","because","as","until","while",
            "of","at","by","for","with","about","against","between","into","through","during","before","after",
            "above","below","to","from","up","down","in","out","on","off","over","under",
            "again","further","then","once","here","there","when","where","why","how",
            "all","any","both","each","few","more","most","other","some","such",
            "no","nor","not","only","own","same","so","than","too","very",
            "s","t","can","will","just","don","should","now","d","ll","m","o","re","ve","y",
            "ain","aren","couldn","didn","doesn","hadn","hasn","haven","isn","ma","mightn","mustn",
            "needn","shan","shouldn","wasn","weren","won","wouldn"
        ];
        Arc::new(words.iter().map(|w| w.to_string()).collect())
    };
}

/// Turns raw text into normalized terms: lowercase, punctuation stripped,
/// whitespace split, stopwords dropped. Order and duplicates are kept.
///
/// The stopword set is frozen at construction and shared between clones. It
/// is persisted with the snapshot so queries are tokenized exactly like the
/// corpus was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tokenizer {
    stopwords: Arc<HashSet<String>>,
}

impl Tokenizer {
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stopwords = stopwords.into_iter().map(|s| s.into().to_lowercase()).collect();
        Self { stopwords: Arc::new(stopwords) }
    }

    /// Tokenizer over the built-in English stopword list.
    pub fn english() -> Self {
        Self { stopwords: Arc::clone(&ENGLISH_STOPWORDS) }
    }

    /// Load stopwords from a file with one word per line. Blank lines and
    /// lines starting with `#` are skipped.
    pub fn from_stopword_file<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;
        let words = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect::<Vec<_>>();
        tracing::debug!(path = %path.display(), count = words.len(), "loaded stopwords");
        Ok(Self::new(words))
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let stripped = NON_WORD.replace_all(&lowered, "");
        stripped
            .split_whitespace()
            .filter(|t| !self.is_stopword(t))
            .map(str::to_string)
            .collect()
    }
}

impl From<Vec<String>> for Tokenizer {
    fn from(words: Vec<String>) -> Self {
        Self::new(words)
    }
}

impl From<Tokenizer> for Vec<String> {
    fn from(t: Tokenizer) -> Self {
        let mut words: Vec<String> = t.stopwords.iter().cloned().collect();
        words.sort();
        words
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::english()
    }
}

/// Tokenize with the built-in English stopword list.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::english().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert_eq!(t, vec!["running", "runners", "run"]);
    }

    #[test]
    fn punctuation_is_removed_not_split() {
        assert_eq!(tokenize("e-mail ... state-of-the-art"), vec!["email", "stateoftheart"]);
    }

    #[test]
    fn custom_stopwords_replace_builtin() {
        let t = Tokenizer::new(["Rust"]);
        assert_eq!(t.tokenize("the Rust book"), vec!["the", "book"]);
    }
}

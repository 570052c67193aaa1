//! In-memory TF-IDF index with brute-force cosine similarity search.
//!
//! Weighting matches the usual "smooth idf" scheme: raw term counts times
//! `ln((1 + n) / (1 + df)) + 1`, then L2-normalised per document. The index
//! is built once and read-only afterwards, so it can be shared behind an
//! `Arc` without locking.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::stopwords::is_stop_word;

/// Word tokens of two or more characters.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid token regex"));

/// Sparse term-weight vector keyed by vocabulary index.
type SparseVector = HashMap<usize, f64>;

/// A document and its similarity to a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDocument {
    /// Position of the document in the slice the index was built from.
    pub index: usize,
    /// Cosine similarity (0.0 to 1.0).
    pub score: f64,
}

/// TF-IDF vectors for a fixed document set.
#[derive(Debug, Clone, Default)]
pub struct TfidfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<SparseVector>,
}

impl TfidfIndex {
    /// Build an index over `documents`. Document order is kept; scores refer
    /// back to positions in this slice.
    pub fn build<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next = vocabulary.len();
                let id = *vocabulary.entry(token.clone()).or_insert(next);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                if !seen.contains(&id) {
                    seen.push(id);
                    doc_freq[id] += 1;
                }
            }
        }

        let n = tokenized.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            documents: Vec::with_capacity(tokenized.len()),
        };
        let documents: Vec<SparseVector> = tokenized.iter().map(|t| index.weigh(t)).collect();
        index.documents = documents;
        index
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct indexed terms.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vectorise free text against this index's vocabulary. Unknown terms
    /// are dropped.
    pub fn vectorize(&self, text: &str) -> HashMap<usize, f64> {
        self.weigh(&tokenize(text))
    }

    /// Similarity of `text` to every document, in document order.
    pub fn scores(&self, text: &str) -> Vec<ScoredDocument> {
        let query = self.vectorize(text);
        self.documents
            .iter()
            .enumerate()
            .map(|(index, doc)| ScoredDocument {
                index,
                score: cosine_similarity(&query, doc),
            })
            .collect()
    }

    /// Up to `k` best documents, highest score first; ties keep document
    /// order.
    pub fn search(&self, text: &str, k: usize) -> Vec<ScoredDocument> {
        let mut scored = self.scores(text);
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        scored.truncate(k);
        scored
    }

    /// The single best document, if the index is non-empty.
    pub fn best_match(&self, text: &str) -> Option<ScoredDocument> {
        self.search(text, 1).into_iter().next()
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut vector: SparseVector = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.vocabulary.get(token) {
                *vector.entry(id).or_insert(0.0) += 1.0;
            }
        }
        for (id, weight) in vector.iter_mut() {
            *weight *= self.idf[*id];
        }
        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Lower-case, split into `\w\w+` tokens, drop stop words.
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Compute cosine similarity between two sparse vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &HashMap<usize, f64>, b: &HashMap<usize, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(id, x)| large.get(id).map(|y| x * y))
        .sum();

    let mag_a: f64 = a.values().map(|x| x.powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.values().map(|x| x.powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
}

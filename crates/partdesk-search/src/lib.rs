//! Catalog search for the parts desk.
//!
//! [`TfidfIndex`] scores free text against product descriptions;
//! [`ProductResolutionEngine`] layers exact, keyword, semantic and
//! remote-catalog lookups on top of it.

pub mod resolver;
pub mod stopwords;
pub mod tfidf;

pub use resolver::ProductResolutionEngine;
pub use tfidf::{cosine_similarity, ScoredDocument, TfidfIndex};

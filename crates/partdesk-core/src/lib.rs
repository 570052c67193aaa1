//! Shared building blocks for the parts-desk pipeline.
//!
//! Configuration, error types, the product/turn data model, catalog and
//! training-corpus loading, and part/model identifier extraction.

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod types;

pub use catalog::{Catalog, TrainingCorpus};
pub use config::PartdeskConfig;
pub use entity::{EntityExtractor, ExtractedEntities};
pub use error::{PartdeskError, Result};
pub use types::*;

//! Startup-loaded, read-only product catalog and training corpus.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{PartdeskError, Result};
use crate::types::{ProductRecord, TrainingExemplar};

// =============================================================================
// Catalog
// =============================================================================

/// Ordered, immutable collection of product records.
///
/// Order is part of the contract: keyword search walks records front to
/// back and stops at the first hit.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ProductRecord>,
}

impl Catalog {
    /// Build a catalog from records, keeping their order.
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of records.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PartdeskError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let records: Vec<ProductRecord> = serde_json::from_str(&content)?;
        if let Some(blank) = records.iter().position(|r| r.identifier.trim().is_empty()) {
            return Err(PartdeskError::Catalog(format!(
                "record {} in {} has an empty part_number",
                blank,
                path.display()
            )));
        }
        info!(path = %path.display(), records = records.len(), "Catalog loaded");
        Ok(Self::new(records))
    }

    /// First record whose primary or alternate identifier equals `id`,
    /// ignoring case.
    pub fn find_by_identifier(&self, id: &str) -> Option<&ProductRecord> {
        self.records.iter().find(|r| r.matches_identifier(id))
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ProductRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ProductRecord;
    type IntoIter = std::slice::Iter<'a, ProductRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// =============================================================================
// TrainingCorpus
// =============================================================================

/// Read-only support-conversation exemplars for the fallback chain.
#[derive(Debug, Clone, Default)]
pub struct TrainingCorpus {
    exemplars: Vec<TrainingExemplar>,
}

impl TrainingCorpus {
    pub fn new(exemplars: Vec<TrainingExemplar>) -> Self {
        Self { exemplars }
    }

    /// Load a JSON array of `{input, output}` pairs.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PartdeskError::Corpus(format!("cannot read {}: {}", path.display(), e))
        })?;
        let exemplars: Vec<TrainingExemplar> = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            exemplars = exemplars.len(),
            "Training corpus loaded"
        );
        Ok(Self::new(exemplars))
    }

    /// Load the corpus, or start with an empty one if the file is missing or
    /// malformed. The similarity responder just never matches then.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!(
                    "Training corpus unavailable at {}: {}. Similarity responder disabled.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn exemplars(&self) -> &[TrainingExemplar] {
        &self.exemplars
    }

    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }
}

//! Deterministic stand-ins for external services, for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use partdesk_core::ProductRecord;

use crate::catalog_api::CatalogLookup;
use crate::model::LanguageModel;
use crate::outcome::ExternalOutcome;

/// A language model that always gives the same outcome and records the
/// prompts it was sent.
pub struct StaticModel {
    label: String,
    outcome: ExternalOutcome<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StaticModel {
    pub fn new(label: impl Into<String>, outcome: ExternalOutcome<String>) -> Self {
        Self {
            label: label.into(),
            outcome,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `reply`.
    pub fn replying(label: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::new(label, ExternalOutcome::Success(reply.into()))
    }

    /// Behaves like a model with no credential.
    pub fn unavailable(label: impl Into<String>) -> Self {
        Self::new(label, ExternalOutcome::Unavailable)
    }

    /// Always fails with `reason`.
    pub fn failing(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(label, ExternalOutcome::Failed(reason.into()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for StaticModel {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_configured(&self) -> bool {
        !matches!(self.outcome, ExternalOutcome::Unavailable)
    }

    async fn complete(&self, _system: &str, prompt: &str) -> ExternalOutcome<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.outcome.clone()
    }
}

/// An in-memory remote catalog. Unknown ids are `Failed`, as a 404 would be.
#[derive(Default)]
pub struct StaticCatalog {
    parts: HashMap<String, ProductRecord>,
    available: bool,
    calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        Self {
            parts: records
                .into_iter()
                .map(|r| (r.identifier.to_uppercase(), r))
                .collect(),
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// A catalog service with no credential configured.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    fn is_configured(&self) -> bool {
        self.available
    }

    async fn fetch_part(&self, part_id: &str) -> ExternalOutcome<ProductRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return ExternalOutcome::Unavailable;
        }
        match self.parts.get(&part_id.to_uppercase()) {
            Some(record) => ExternalOutcome::Success(record.clone()),
            None => ExternalOutcome::Failed(format!("service returned status 404: {}", part_id)),
        }
    }
}

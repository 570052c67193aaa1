//! Answer handlers and their shared trait.
//!
//! Each handler turns a query plus the conversation so far into a reply.
//! Handlers never fail: a lookup that finds nothing produces a clarifying
//! or "couldn't find" reply instead.

pub mod compatibility;
pub mod installation;
pub mod order;
pub mod product;

use async_trait::async_trait;
use partdesk_core::ProductRecord;
use serde::Serialize;

use crate::context::ConversationContext;

pub use compatibility::CompatibilityResolver;
pub use installation::InstallationResolver;
pub use order::OrderSupportResolver;
pub use product::{format_record, ProductResolver};

/// What a handler answered, and who answered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerReply {
    pub text: String,
    /// Agent tag for logs and clients.
    pub agent: String,
    /// The catalog record the answer is about, when there is one.
    pub record: Option<ProductRecord>,
}

impl HandlerReply {
    pub fn new(text: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agent: agent.into(),
            record: None,
        }
    }

    pub fn with_record(mut self, record: ProductRecord) -> Self {
        self.record = Some(record);
        self
    }
}

/// A responder the orchestrator can dispatch to.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Handler name for logs.
    fn name(&self) -> &'static str;

    /// Answer `query`. The context already holds `query` as its latest
    /// user turn.
    async fn handle(&self, query: &str, context: &ConversationContext) -> HandlerReply;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use partdesk_core::config::ResolutionConfig;
    use partdesk_core::{Catalog, ProductRecord};
    use partdesk_llm::{CatalogLookup, StaticCatalog};
    use partdesk_search::ProductResolutionEngine;

    pub fn record(id: &str, name: &str, models: &[&str]) -> ProductRecord {
        ProductRecord {
            identifier: id.to_string(),
            alternate_identifiers: Vec::new(),
            name: name.to_string(),
            description: format!("{} for testing.", name),
            compatible_models: models.iter().map(|m| m.to_string()).collect(),
            installation_text: None,
            instructions: None,
            image_ref: None,
        }
    }

    pub fn catalog() -> Arc<Catalog> {
        let mut gasket = record("PS12345", "Door Gasket", &["ABC123WP", "DEF456"]);
        gasket.installation_text = Some("Pull the old gasket off and press the new one in.".to_string());
        let mut valve = record("PS67890", "Water Inlet Valve", &["KDTE334GPS0"]);
        valve.instructions = Some("Shut off the water supply before removing the valve.".to_string());
        valve.installation_text = Some("Unused when instructions exist.".to_string());
        Arc::new(Catalog::new(vec![gasket, valve]))
    }

    pub fn engine_with(remote: Arc<dyn CatalogLookup>) -> Arc<ProductResolutionEngine> {
        Arc::new(ProductResolutionEngine::new(
            catalog(),
            remote,
            &ResolutionConfig::default(),
        ))
    }

    pub fn engine() -> Arc<ProductResolutionEngine> {
        engine_with(Arc::new(StaticCatalog::unavailable()))
    }
}

//! Product lookups.

use std::sync::Arc;

use async_trait::async_trait;
use partdesk_core::{EntityExtractor, ProductRecord, ResolutionResult, ResolutionSource};
use partdesk_search::ProductResolutionEngine;
use tracing::debug;

use super::{HandlerReply, QueryHandler};
use crate::context::ConversationContext;

pub const AGENT: &str = "product_search";

const ASK_FOR_IDENTIFIERS: &str = "Please specify both the part number and the model number of your appliance. \
You can usually find the model number on a sticker inside the appliance door or on the back panel.";

/// Answers "tell me about this part" queries from the catalog.
pub struct ProductResolver {
    engine: Arc<ProductResolutionEngine>,
    extractor: EntityExtractor,
    include_assistant_turns: bool,
}

impl ProductResolver {
    pub fn new(engine: Arc<ProductResolutionEngine>, include_assistant_turns: bool) -> Self {
        Self {
            engine,
            extractor: EntityExtractor::new(),
            include_assistant_turns,
        }
    }
}

#[async_trait]
impl QueryHandler for ProductResolver {
    fn name(&self) -> &'static str {
        AGENT
    }

    async fn handle(&self, query: &str, context: &ConversationContext) -> HandlerReply {
        let window = context.window_text(self.include_assistant_turns);
        let result = self.engine.resolve(query, &window).await;

        if let Some(record) = &result.record {
            debug!(part = %record.identifier, source = ?result.source, "Product resolved");
            return HandlerReply::new(format_record(record, &result), AGENT)
                .with_record(record.clone());
        }

        let part_id = self
            .extractor
            .find_part_id(&window)
            .or_else(|| self.extractor.find_part_id(query));
        let text = match part_id {
            Some(id) => format!(
                "I couldn't find part number {} in our current catalog. Please double-check the part number, \
                 or provide your appliance's model number so I can help you find the right part.",
                id
            ),
            None => ASK_FOR_IDENTIFIERS.to_string(),
        };
        HandlerReply::new(text, AGENT)
    }
}

/// Multi-line customer-facing description of a resolved record.
pub fn format_record(record: &ProductRecord, result: &ResolutionResult) -> String {
    let mut lines = vec![format!("{} (part {})", record.name, record.identifier)];

    if !record.description.trim().is_empty() {
        lines.push(record.description.trim().to_string());
    }
    if !record.compatible_models.is_empty() {
        lines.push(format!(
            "Compatible models: {}",
            record.compatible_models.join(", ")
        ));
    }
    if let Some(install) = record.installation_text.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Installation: {}", install.trim()));
    }
    if let Some(image) = record.image_ref.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Image: {}", image.trim()));
    }
    if result.source == ResolutionSource::Semantic {
        lines.push(format!(
            "This is the closest match I found (similarity {:.2}).",
            result.confidence
        ));
    }

    lines.join("\n")
}

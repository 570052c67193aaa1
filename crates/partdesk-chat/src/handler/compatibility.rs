//! "Does part X fit model Y" checks.

use std::sync::Arc;

use async_trait::async_trait;
use partdesk_core::EntityExtractor;
use partdesk_search::ProductResolutionEngine;
use tracing::debug;

use super::{HandlerReply, QueryHandler};
use crate::context::ConversationContext;

pub const AGENT: &str = "compatibility";

/// Checks a part against a model, asking for whichever identifier is
/// missing from the conversation.
pub struct CompatibilityResolver {
    engine: Arc<ProductResolutionEngine>,
    extractor: EntityExtractor,
    include_assistant_turns: bool,
}

impl CompatibilityResolver {
    pub fn new(engine: Arc<ProductResolutionEngine>, include_assistant_turns: bool) -> Self {
        Self {
            engine,
            extractor: EntityExtractor::new(),
            include_assistant_turns,
        }
    }
}

#[async_trait]
impl QueryHandler for CompatibilityResolver {
    fn name(&self) -> &'static str {
        AGENT
    }

    async fn handle(&self, query: &str, context: &ConversationContext) -> HandlerReply {
        let mut window = context.window_text(self.include_assistant_turns);
        if window.is_empty() {
            window = query.to_string();
        }
        let entities = self.extractor.extract(&window);

        let (part, model) = match (entities.part_id, entities.model_id) {
            (None, None) => {
                return HandlerReply::new(
                    "Please specify both the part number and the model number.",
                    AGENT,
                )
            }
            (None, Some(model)) => {
                return HandlerReply::new(
                    format!(
                        "I can see model {}, but I need the part number too. What part are you asking about?",
                        model
                    ),
                    AGENT,
                )
            }
            (Some(part), None) => {
                return HandlerReply::new(
                    format!(
                        "I can see part number {}, but I need your appliance model number to check compatibility.",
                        part
                    ),
                    AGENT,
                )
            }
            (Some(part), Some(model)) => (part, model),
        };

        let result = self.engine.resolve_part(&part).await;
        let Some(record) = result.record else {
            return HandlerReply::new(
                format!("I couldn't find part {} in our catalogue.", part),
                AGENT,
            );
        };

        let fits = record.fits_model(&model);
        debug!(part = %part, model = %model, fits, "Compatibility checked");
        let text = if fits {
            format!("Yes, part {} is compatible with model {}.", part, model.to_uppercase())
        } else {
            format!(
                "No, part {} is not listed as compatible with model {}.",
                part,
                model.to_uppercase()
            )
        };
        HandlerReply::new(text, AGENT).with_record(record)
    }
}

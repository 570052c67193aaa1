//! Installation and troubleshooting guidance.

use std::sync::Arc;

use async_trait::async_trait;
use partdesk_core::EntityExtractor;
use partdesk_llm::{LanguageModel, SYSTEM_PROMPT};
use partdesk_search::ProductResolutionEngine;
use tracing::debug;

use super::{HandlerReply, QueryHandler};
use crate::context::ConversationContext;

pub const AGENT: &str = "installation";

const ICE_MAKER_STEPS: &str = "Here are common ice maker troubleshooting steps:\n\n\
1. **Check Power**: Make sure the ice maker is switched ON (the switch is usually inside the freezer)\n\
2. **Water Supply**: Verify the water line is connected and the water filter isn't clogged\n\
3. **Reset**: Turn the ice maker OFF for 24 hours, then back ON\n\
4. **Temperature**: The freezer should be at 0-5°F for proper ice production\n\
5. **Water Filter**: Replace it if it is older than 6 months\n\n\
If these steps don't help, you may need to replace the ice maker assembly. \
What's your refrigerator model number? I can find the right replacement part.";

const REFRIGERATOR_STEPS: &str = "I can help troubleshoot refrigerator issues! Common problems include:\n\n\
• **Not cooling**: Check temperature settings, clean the coils, replace the air filter\n\
• **Water/ice issues**: Replace the water filter, check water line connections\n\
• **Noise**: Check for loose parts, level the unit\n\
• **Door seals**: Clean the gaskets, check for tears\n\n\
What specific problem are you experiencing? Please also share your model number \
so I can give targeted guidance and part recommendations.";

const DISHWASHER_STEPS: &str = "Common dishwasher troubleshooting steps:\n\n\
• **Not cleaning well**: Clean the spray arms, check water temperature (120°F)\n\
• **Not draining**: Clean the filter, check the garbage disposal connection\n\
• **Leaking**: Inspect door seals, check spray arm connections\n\
• **Not starting**: Check the door latch, reset the circuit breaker\n\n\
What's the specific issue you're facing? Your model number would help me \
give more targeted advice and part suggestions.";

const ASK_FOR_DETAILS: &str = "I'd be happy to help with installation or troubleshooting! \
For the best assistance, please provide:\n\n\
1. **Appliance type** (refrigerator, dishwasher, etc.)\n\
2. **Model number** (usually on a sticker inside the door)\n\
3. **Specific issue** you're experiencing\n\
4. **Part number** (if you have a specific part in mind)\n\n\
This helps me give accurate troubleshooting steps and recommend the right replacement parts.";

/// Words that mean the customer is asking about a specific part rather than
/// a symptom.
const PART_WORDS: &[&str] = &["part", "install", "replace"];
const INSTALL_WORDS: &[&str] = &["install", "installation", "replace"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn mentions_ice_maker(q: &str) -> bool {
    q.contains("ice maker")
        || q.contains("icemaker")
        || q.split(|c: char| !c.is_alphanumeric()).any(|w| w == "ice")
}

/// Troubleshooting text for common symptoms, catalog installation steps for
/// a known part, then the language models, then a request for details.
pub struct InstallationResolver {
    engine: Arc<ProductResolutionEngine>,
    models: Vec<Arc<dyn LanguageModel>>,
    extractor: EntityExtractor,
    include_assistant_turns: bool,
}

impl InstallationResolver {
    pub fn new(
        engine: Arc<ProductResolutionEngine>,
        models: Vec<Arc<dyn LanguageModel>>,
        include_assistant_turns: bool,
    ) -> Self {
        Self {
            engine,
            models,
            extractor: EntityExtractor::new(),
            include_assistant_turns,
        }
    }

    async fn ask_models(&self, query: &str) -> Option<String> {
        let prompt = format!(
            "You are a repair assistant specialised in refrigerators and dishwashers. \
             Provide concise troubleshooting steps for the following problem: {}",
            query
        );
        for model in &self.models {
            let outcome = model.complete(SYSTEM_PROMPT, &prompt).await;
            let state = outcome.state();
            match outcome.success().filter(|text| !text.trim().is_empty()) {
                Some(text) => return Some(text),
                None => debug!(model = model.label(), state, "Repair model gave no answer"),
            }
        }
        None
    }
}

#[async_trait]
impl QueryHandler for InstallationResolver {
    fn name(&self) -> &'static str {
        AGENT
    }

    async fn handle(&self, query: &str, context: &ConversationContext) -> HandlerReply {
        let q = query.to_lowercase();

        if mentions_ice_maker(&q) {
            return HandlerReply::new(ICE_MAKER_STEPS, AGENT);
        }
        if contains_any(&q, &["refrigerator", "fridge", "freezer"]) && !contains_any(&q, PART_WORDS) {
            return HandlerReply::new(REFRIGERATOR_STEPS, AGENT);
        }
        if q.contains("dishwasher") && !contains_any(&q, PART_WORDS) {
            return HandlerReply::new(DISHWASHER_STEPS, AGENT);
        }

        if contains_any(&q, INSTALL_WORDS) {
            let window = context.window_text(self.include_assistant_turns);
            let part_id = self
                .extractor
                .find_part_id(&window)
                .or_else(|| self.extractor.find_part_id(query));
            if let Some(part_id) = part_id {
                let result = self.engine.resolve_part(&part_id).await;
                if let Some(record) = result.record {
                    if let Some(guidance) = record.install_guidance() {
                        let text = guidance.to_string();
                        return HandlerReply::new(text, AGENT).with_record(record);
                    }
                    debug!(part = %part_id, "Part has no installation text");
                }
            }
        }

        match self.ask_models(query).await {
            Some(text) => HandlerReply::new(text, AGENT),
            None => HandlerReply::new(ASK_FOR_DETAILS, AGENT),
        }
    }
}

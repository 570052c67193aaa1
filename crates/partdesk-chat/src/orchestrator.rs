//! Per-message coordinator: classify, dispatch, record.

use std::sync::Arc;

use partdesk_core::config::{ExtractionConfig, PartdeskConfig};
use partdesk_core::{Catalog, EntityExtractor, IntentLabel, ProductRecord, TrainingCorpus};
use partdesk_llm::{CatalogApiClient, CatalogLookup, ChatModelClient, LanguageModel};
use partdesk_search::ProductResolutionEngine;
use serde::Serialize;
use tracing::{debug, info};

use crate::context::{ConversationContext, SLOT_MODEL_ID, SLOT_PART_ID};
use crate::error::ChatError;
use crate::fallback::FallbackChain;
use crate::handler::{
    CompatibilityResolver, HandlerReply, InstallationResolver, OrderSupportResolver,
    ProductResolver, QueryHandler,
};
use crate::intent::IntentRouter;

/// Raw-query words that confirm an installation request.
const INSTALLATION_CONFIRMATIONS: &[&str] =
    &["install", "replace part", "how to install", "installation guide"];
/// Raw-query words that confirm an order request.
const ORDER_CONFIRMATIONS: &[&str] = &["order", "delivery", "shipping", "tracking"];

const VALIDATION_AGENT: &str = "validation";

/// Which handler a classified message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Product,
    Compatibility,
    Installation,
    OrderSupport,
    Fallback,
}

impl Dispatch {
    /// Installation and order intents only reach their handlers when the
    /// raw query confirms them; otherwise the fallback chain answers.
    pub fn for_intent(intent: IntentLabel, query: &str) -> Self {
        let q = query.to_lowercase();
        let confirmed = |words: &[&str]| words.iter().any(|w| q.contains(w));

        match intent {
            IntentLabel::ProductInfo => Dispatch::Product,
            IntentLabel::Compatibility => Dispatch::Compatibility,
            IntentLabel::Installation if confirmed(INSTALLATION_CONFIRMATIONS) => {
                Dispatch::Installation
            }
            IntentLabel::OrderSupport if confirmed(ORDER_CONFIRMATIONS) => Dispatch::OrderSupport,
            _ => Dispatch::Fallback,
        }
    }
}

/// The answer to one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub text: String,
    /// Which handler or fallback stage answered.
    pub agent: String,
    pub intent: IntentLabel,
    /// Catalog record the answer is about, when one was resolved.
    pub record: Option<ProductRecord>,
}

/// Composes intent routing, the handlers and the fallback chain.
pub struct Orchestrator {
    router: IntentRouter,
    product: ProductResolver,
    compatibility: CompatibilityResolver,
    installation: InstallationResolver,
    order: OrderSupportResolver,
    fallback: FallbackChain,
    extractor: EntityExtractor,
    extraction: ExtractionConfig,
    max_message_length: usize,
}

impl Orchestrator {
    /// Wire the pipeline from already-built parts. `models` are the two
    /// hosted models, in order; the installation handler also uses them.
    pub fn new(
        engine: Arc<ProductResolutionEngine>,
        router: IntentRouter,
        fallback: FallbackChain,
        models: Vec<Arc<dyn LanguageModel>>,
        config: &PartdeskConfig,
    ) -> Self {
        let include_assistant = config.extraction.include_assistant_turns;
        Self {
            router,
            product: ProductResolver::new(engine.clone(), include_assistant),
            compatibility: CompatibilityResolver::new(engine.clone(), include_assistant),
            installation: InstallationResolver::new(engine, models, include_assistant),
            order: OrderSupportResolver::new(),
            fallback,
            extractor: EntityExtractor::new(),
            extraction: config.extraction.clone(),
            max_message_length: config.chat.max_message_length,
        }
    }

    /// Build the whole pipeline from configuration, with real HTTP clients.
    pub fn from_config(
        config: &PartdeskConfig,
        catalog: Arc<Catalog>,
        corpus: Arc<TrainingCorpus>,
    ) -> Result<Self, ChatError> {
        let primary: Arc<dyn LanguageModel> =
            Arc::new(ChatModelClient::from_config(&config.models.primary)?);
        let secondary: Arc<dyn LanguageModel> =
            Arc::new(ChatModelClient::from_config(&config.models.secondary)?);
        let generative = if config.models.generative.enabled {
            let model: Arc<dyn LanguageModel> =
                Arc::new(ChatModelClient::from_config(&config.models.generative)?);
            Some(model)
        } else {
            None
        };
        let remote = Arc::new(CatalogApiClient::from_config(&config.catalog_api)?);

        let models = vec![primary, secondary];
        info!(
            primary = models[0].is_configured(),
            secondary = models[1].is_configured(),
            generative = generative.is_some(),
            catalog_api = remote.is_configured(),
            "External services wired"
        );

        let engine = Arc::new(ProductResolutionEngine::new(
            catalog,
            remote,
            &config.resolution,
        ));
        let router = IntentRouter::from_models(&models);
        let fallback = FallbackChain::new(
            models.clone(),
            corpus,
            generative,
            config.fallback.clone(),
        );

        Ok(Self::new(engine, router, fallback, models, config))
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    /// Answer one message and record both turns in `context`.
    pub async fn handle_message(&self, query: &str, context: &mut ConversationContext) -> ChatReply {
        let length = query.chars().count();
        if length > self.max_message_length {
            debug!(length, max = self.max_message_length, "Message too long");
            return ChatReply {
                text: format!(
                    "Your message is {} characters long. Please keep it under {} characters \
                     and include the part or model number you're asking about.",
                    length, self.max_message_length
                ),
                agent: VALIDATION_AGENT.to_string(),
                intent: IntentLabel::General,
                record: None,
            };
        }

        context.push_user(query);
        self.fill_slots(context);

        let intent = self.router.classify(query, context).await;
        let dispatch = Dispatch::for_intent(intent, query);
        let handler = self.handler(dispatch);
        let reply: HandlerReply = handler.handle(query, context).await;

        info!(
            session = %context.session_id(),
            intent = %intent,
            dispatch = ?dispatch,
            handler = handler.name(),
            agent = %reply.agent,
            "Message handled"
        );

        context.push_assistant(reply.text.clone());
        ChatReply {
            text: reply.text,
            agent: reply.agent,
            intent,
            record: reply.record,
        }
    }

    fn handler(&self, dispatch: Dispatch) -> &dyn QueryHandler {
        match dispatch {
            Dispatch::Product => &self.product,
            Dispatch::Compatibility => &self.compatibility,
            Dispatch::Installation => &self.installation,
            Dispatch::OrderSupport => &self.order,
            Dispatch::Fallback => &self.fallback,
        }
    }

    fn fill_slots(&self, context: &mut ConversationContext) {
        let window = context.window_text(self.extraction.include_assistant_turns);
        let entities = self.extractor.extract(&window);
        if let Some(part) = entities.part_id {
            context.set_slot(SLOT_PART_ID, part);
        }
        if let Some(model) = entities.model_id {
            context.set_slot(SLOT_MODEL_ID, model);
        }
    }
}

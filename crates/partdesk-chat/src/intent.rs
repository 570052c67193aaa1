//! Intent classification.
//!
//! Two strategies sit behind [`IntentClassifier`]: ordered keyword rules,
//! and a language model asked for a single label that falls back to the
//! rules. [`IntentRouter`] picks one at startup.

use std::sync::Arc;

use async_trait::async_trait;
use partdesk_core::{EntityExtractor, IntentLabel};
use partdesk_llm::{ExternalOutcome, LanguageModel, SYSTEM_PROMPT};
use tracing::{debug, info};

use crate::context::ConversationContext;

// Keyword groups, checked in this order. Matching is by substring of the
// lower-cased query.
const INSTALLATION_KEYWORDS: &[&str] = &[
    "install",
    "installation",
    "fix",
    "repair",
    "replace",
    "broken",
    "not working",
    "issue",
    "problem",
    "troubleshoot",
    "how to",
];
const COMPATIBILITY_KEYWORDS: &[&str] = &["compatible", "fit", "model", "work with"];
const ORDER_KEYWORDS: &[&str] = &["order", "return", "refund", "track", "shipping", "delivery"];
const PRODUCT_KEYWORDS: &[&str] = &["part", "parts", "find", "search", "looking for"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// A way of labelling a query.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    async fn classify(&self, query: &str, context: &ConversationContext) -> IntentLabel;
}

// =============================================================================
// Rule-based
// =============================================================================

/// Ordered keyword rules; first matching group wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier {
    extractor: EntityExtractor,
}

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous core of the rules, usable without a context.
    pub fn classify_text(&self, query: &str) -> IntentLabel {
        let q = query.to_lowercase();

        if contains_any(&q, INSTALLATION_KEYWORDS) {
            IntentLabel::Installation
        } else if contains_any(&q, COMPATIBILITY_KEYWORDS) {
            IntentLabel::Compatibility
        } else if contains_any(&q, ORDER_KEYWORDS) {
            IntentLabel::OrderSupport
        } else if self.extractor.has_part_id(query) || contains_any(&q, PRODUCT_KEYWORDS) {
            IntentLabel::ProductInfo
        } else {
            IntentLabel::General
        }
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn classify(&self, query: &str, _context: &ConversationContext) -> IntentLabel {
        self.classify_text(query)
    }
}

// =============================================================================
// Model-based
// =============================================================================

/// Asks language models for a label, in order, and falls back to the rules
/// when the answer is missing or not a known label.
pub struct ModelBasedClassifier {
    models: Vec<Arc<dyn LanguageModel>>,
    rules: RuleBasedClassifier,
}

impl ModelBasedClassifier {
    pub fn new(models: Vec<Arc<dyn LanguageModel>>) -> Self {
        Self {
            models,
            rules: RuleBasedClassifier::new(),
        }
    }

    fn prompt(query: &str) -> String {
        let labels = IntentLabel::ALL
            .iter()
            .map(IntentLabel::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "You are an intent classification engine for an e-commerce appliance parts chatbot. \
             Given a user query, respond with one of the following intent labels: {}. \
             Return only the label without any explanation. Query: {}",
            labels, query
        )
    }
}

/// First whitespace token of a model reply, lower-cased and stripped of
/// surrounding punctuation, if it names a label.
pub fn parse_label(reply: &str) -> Option<IntentLabel> {
    let token = reply.split_whitespace().next()?;
    let token = token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
        .to_lowercase();
    token.parse().ok()
}

#[async_trait]
impl IntentClassifier for ModelBasedClassifier {
    fn name(&self) -> &'static str {
        "model_based"
    }

    async fn classify(&self, query: &str, context: &ConversationContext) -> IntentLabel {
        let prompt = Self::prompt(query);

        for model in &self.models {
            match model.complete(SYSTEM_PROMPT, &prompt).await {
                ExternalOutcome::Success(reply) => {
                    return match parse_label(&reply) {
                        Some(label) => {
                            debug!(model = model.label(), intent = %label, "Model classified query");
                            label
                        }
                        None => {
                            debug!(model = model.label(), reply = %reply, "Unrecognised label, using rules");
                            self.rules.classify(query, context).await
                        }
                    };
                }
                outcome => {
                    debug!(model = model.label(), state = outcome.state(), "Classifier model gave no reply");
                }
            }
        }

        self.rules.classify(query, context).await
    }
}

// =============================================================================
// Router
// =============================================================================

/// Holds the classification strategy chosen at startup.
pub struct IntentRouter {
    strategy: Box<dyn IntentClassifier>,
}

impl IntentRouter {
    pub fn new(strategy: impl IntentClassifier + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    pub fn rule_based() -> Self {
        Self::new(RuleBasedClassifier::new())
    }

    /// Model-based when any of `models` is configured (only configured ones
    /// are consulted), otherwise rule-based.
    pub fn from_models(models: &[Arc<dyn LanguageModel>]) -> Self {
        let configured: Vec<Arc<dyn LanguageModel>> = models
            .iter()
            .filter(|m| m.is_configured())
            .cloned()
            .collect();

        let router = if configured.is_empty() {
            Self::rule_based()
        } else {
            Self::new(ModelBasedClassifier::new(configured))
        };
        info!(strategy = router.strategy_name(), "Intent router ready");
        router
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub async fn classify(&self, query: &str, context: &ConversationContext) -> IntentLabel {
        self.strategy.classify(query, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partdesk_llm::StaticModel;

    fn rules() -> RuleBasedClassifier {
        RuleBasedClassifier::new()
    }

    fn ctx() -> ConversationContext {
        ConversationContext::new("test")
    }

    // ---- Rule-based ----

    #[test]
    fn test_rules_installation_first() {
        assert_eq!(rules().classify_text("How to install PS12345"), IntentLabel::Installation);
        assert_eq!(rules().classify_text("my ice maker is broken"), IntentLabel::Installation);
        assert_eq!(
            rules().classify_text("is the replacement compatible"),
            IntentLabel::Installation,
            "installation keywords outrank compatibility"
        );
    }

    #[test]
    fn test_rules_compatibility() {
        assert_eq!(
            rules().classify_text("does it fit model ABC123WP"),
            IntentLabel::Compatibility
        );
        assert_eq!(
            rules().classify_text("PS99999 compatible with XYZ000?"),
            IntentLabel::Compatibility
        );
    }

    #[test]
    fn test_rules_order() {
        assert_eq!(rules().classify_text("where is my order"), IntentLabel::OrderSupport);
        assert_eq!(rules().classify_text("I want a refund"), IntentLabel::OrderSupport);
    }

    #[test]
    fn test_rules_product_by_pattern_or_keyword() {
        assert_eq!(rules().classify_text("I need PS12345"), IntentLabel::ProductInfo);
        assert_eq!(
            rules().classify_text("looking for a door bin"),
            IntentLabel::ProductInfo
        );
    }

    #[test]
    fn test_rules_general_default() {
        assert_eq!(rules().classify_text("hello there"), IntentLabel::General);
        assert_eq!(rules().classify_text(""), IntentLabel::General);
    }

    // ---- Label parsing ----

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("compatibility"), Some(IntentLabel::Compatibility));
        assert_eq!(parse_label("  Order_Support.\n"), Some(IntentLabel::OrderSupport));
        assert_eq!(parse_label("\"general\" is my answer"), Some(IntentLabel::General));
        assert_eq!(parse_label("shipping"), None);
        assert_eq!(parse_label(""), None);
        assert_eq!(parse_label("   "), None);
    }

    // ---- Model-based ----

    #[tokio::test]
    async fn test_model_label_used() {
        let model = Arc::new(StaticModel::replying("a", "order_support"));
        let classifier = ModelBasedClassifier::new(vec![model.clone()]);
        let label = classifier.classify("hello", &ctx()).await;
        assert_eq!(label, IntentLabel::OrderSupport);
        assert!(model.prompts()[0].contains("Query: hello"));
        assert!(model.prompts()[0].contains("product_info, compatibility"));
    }

    #[tokio::test]
    async fn test_invalid_label_falls_back_to_rules() {
        let a = Arc::new(StaticModel::replying("a", "banana"));
        let b = Arc::new(StaticModel::replying("b", "general"));
        let classifier = ModelBasedClassifier::new(vec![a, b.clone()]);
        let label = classifier.classify("where is my order", &ctx()).await;
        assert_eq!(label, IntentLabel::OrderSupport);
        assert_eq!(b.call_count(), 0, "a reply from A stops the search");
    }

    #[tokio::test]
    async fn test_second_model_tried_when_first_silent() {
        let a = Arc::new(StaticModel::unavailable("a"));
        let b = Arc::new(StaticModel::replying("b", "installation"));
        let classifier = ModelBasedClassifier::new(vec![a.clone(), b.clone()]);
        assert_eq!(classifier.classify("hi", &ctx()).await, IntentLabel::Installation);
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
    }

    #[tokio::test]
    async fn test_all_models_fail_uses_rules() {
        let a = Arc::new(StaticModel::failing("a", "500"));
        let b = Arc::new(StaticModel::unavailable("b"));
        let classifier = ModelBasedClassifier::new(vec![a, b]);
        assert_eq!(
            classifier.classify("I need PS12345", &ctx()).await,
            IntentLabel::ProductInfo
        );
    }

    // ---- Router ----

    #[tokio::test]
    async fn test_router_rule_based_without_configured_models() {
        let models: Vec<Arc<dyn LanguageModel>> = vec![
            Arc::new(StaticModel::unavailable("a")),
            Arc::new(StaticModel::unavailable("b")),
        ];
        let router = IntentRouter::from_models(&models);
        assert_eq!(router.strategy_name(), "rule_based");
        assert_eq!(router.classify("I need PS12345", &ctx()).await, IntentLabel::ProductInfo);
    }

    #[tokio::test]
    async fn test_router_model_based_with_one_configured() {
        let models: Vec<Arc<dyn LanguageModel>> = vec![
            Arc::new(StaticModel::unavailable("a")),
            Arc::new(StaticModel::replying("b", "general")),
        ];
        let router = IntentRouter::from_models(&models);
        assert_eq!(router.strategy_name(), "model_based");
        assert_eq!(router.classify("I need PS12345", &ctx()).await, IntentLabel::General);
    }
}

//! Answers for open-ended questions.
//!
//! Responders are tried in a fixed order until one produces an acceptable
//! answer:
//!
//! 1. primary language model
//! 2. secondary language model
//! 3. closest match in the support-conversation corpus
//! 4. optional generative model, with a stricter quality gate
//! 5. a built-in keyword table, which always answers
//!
//! [`FallbackChain::answer`] reports which stage produced the text.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use partdesk_core::config::FallbackConfig;
use partdesk_core::{TrainingCorpus, TrainingExemplar};
use partdesk_llm::{ExternalOutcome, LanguageModel, SYSTEM_PROMPT};
use serde::Serialize;
use tracing::{debug, info};

use crate::context::ConversationContext;
use crate::handler::{HandlerReply, QueryHandler};

/// Terms that earn a similarity boost when both texts contain them.
const DOMAIN_TERMS: &[&str] = &[
    "refrigerator",
    "fridge",
    "dishwasher",
    "washing",
    "machine",
    "dryer",
    "cooling",
    "cleaning",
    "leaking",
    "filter",
    "light",
    "bulb",
    "water",
];

/// A generative reply must mention one of these.
const GENERATIVE_ALLOWLIST: &[&str] = &["refrigerator", "dishwasher", "appliance", "part"];
/// A generative reply must not contain any of these.
const GENERATIVE_DENYLIST: &[&str] = &["cooler cooler", "no idea", "guess"];

/// Which responder produced a fallback answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FallbackStage {
    /// One of the two hosted models, by label.
    Model(String),
    TrainingCorpus,
    /// The optional generative model, by label.
    Generative(String),
    Canned,
}

impl FallbackStage {
    /// Agent tag reported to clients.
    pub fn tag(&self) -> String {
        match self {
            FallbackStage::Model(label) | FallbackStage::Generative(label) => {
                format!("general_{}", label)
            }
            FallbackStage::TrainingCorpus => "general_smart_fallback".to_string(),
            FallbackStage::Canned => "general_smart_fallback_final".to_string(),
        }
    }
}

/// Text from the fallback chain and the stage it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackAnswer {
    pub text: String,
    pub stage: FallbackStage,
}

/// The ordered responders behind general questions.
pub struct FallbackChain {
    models: Vec<Arc<dyn LanguageModel>>,
    corpus: Arc<TrainingCorpus>,
    generative: Option<Arc<dyn LanguageModel>>,
    config: FallbackConfig,
}

impl FallbackChain {
    /// `models` are stages 1 and 2, in order. `generative` is stage 4.
    pub fn new(
        models: Vec<Arc<dyn LanguageModel>>,
        corpus: Arc<TrainingCorpus>,
        generative: Option<Arc<dyn LanguageModel>>,
        config: FallbackConfig,
    ) -> Self {
        Self {
            models,
            corpus,
            generative,
            config,
        }
    }

    /// Answer `query`. Never empty.
    pub async fn resolve(&self, query: &str) -> String {
        self.answer(query).await.text
    }

    /// Answer `query` and report which stage answered.
    pub async fn answer(&self, query: &str) -> FallbackAnswer {
        let prompt = format!(
            "You are an assistant for an e-commerce appliance parts site. \
             Answer the following question in a concise, friendly manner: {}",
            query
        );

        for model in &self.models {
            match model.complete(SYSTEM_PROMPT, &prompt).await {
                ExternalOutcome::Success(text) if accept_model_reply(&text) => {
                    return self.accepted(text, FallbackStage::Model(model.label().to_string()));
                }
                ExternalOutcome::Success(_) => {
                    debug!(model = model.label(), "Model reply rejected by quality gate")
                }
                outcome => debug!(model = model.label(), state = outcome.state(), "Model stage skipped"),
            }
        }

        if let Some((exemplar, score)) = self.best_training_match(query) {
            debug!(score, "Training corpus match");
            return self.accepted(exemplar.output.clone(), FallbackStage::TrainingCorpus);
        }

        if let Some(model) = &self.generative {
            match model.complete(SYSTEM_PROMPT, query).await {
                ExternalOutcome::Success(text)
                    if accept_generative_reply(&text, self.config.generative_min_length) =>
                {
                    return self.accepted(text, FallbackStage::Generative(model.label().to_string()));
                }
                ExternalOutcome::Success(_) => {
                    debug!(model = model.label(), "Generative reply rejected by quality gate")
                }
                outcome => {
                    debug!(model = model.label(), state = outcome.state(), "Generative stage skipped")
                }
            }
        }

        self.accepted(canned_response(query).to_string(), FallbackStage::Canned)
    }

    fn accepted(&self, text: String, stage: FallbackStage) -> FallbackAnswer {
        info!(stage = %stage.tag(), "Fallback answered");
        FallbackAnswer { text, stage }
    }

    /// Best-scoring exemplar with a non-empty answer, if it scores above the
    /// threshold. Ties keep the earlier exemplar.
    pub fn best_training_match(&self, query: &str) -> Option<(&TrainingExemplar, f64)> {
        let mut best: Option<(&TrainingExemplar, f64)> = None;
        for exemplar in self.corpus.exemplars() {
            if exemplar.output.trim().is_empty() {
                continue;
            }
            let score = self.training_score(query, &exemplar.input);
            if score > self.config.similarity_threshold
                && best.map_or(true, |(_, best_score)| score > best_score)
            {
                best = Some((exemplar, score));
            }
        }
        best
    }

    /// Jaccard word overlap plus the domain-term boost.
    pub fn training_score(&self, query: &str, input: &str) -> f64 {
        let q = query.to_lowercase();
        let i = input.to_lowercase();
        let shared_terms = DOMAIN_TERMS
            .iter()
            .filter(|term| q.contains(*term) && i.contains(*term))
            .count();
        jaccard_similarity(query, input) + shared_terms as f64 * self.config.domain_boost
    }
}

#[async_trait]
impl QueryHandler for FallbackChain {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn handle(&self, query: &str, _context: &ConversationContext) -> HandlerReply {
        let answer = self.answer(query).await;
        HandlerReply::new(answer.text, answer.stage.tag())
    }
}

/// Hosted-model replies must be non-blank and must not mention "error".
fn accept_model_reply(text: &str) -> bool {
    !text.trim().is_empty() && !text.to_lowercase().contains("error")
}

fn accept_generative_reply(text: &str, min_length: usize) -> bool {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    trimmed.chars().count() > min_length
        && GENERATIVE_ALLOWLIST.iter().any(|w| lower.contains(w))
        && !GENERATIVE_DENYLIST.iter().any(|w| lower.contains(w))
}

/// Jaccard similarity of the lower-cased whitespace-separated word sets.
/// 0.0 when either side has no words.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let a: HashSet<&str> = a.split_whitespace().collect();
    let b: HashSet<&str> = b.split_whitespace().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}

// -----------------------------------------------------------------
// Canned responses
// -----------------------------------------------------------------

const FRIDGE_COOLING: &str = "For refrigerator cooling issues, check: 1) Temperature settings (should be 37-40°F), \
2) Clean condenser coils (usually on the back or bottom), 3) Door seals for gaps, 4) Frost buildup in the freezer. \
If these don't help, you may need a new thermostat, evaporator fan, or compressor.";
const FRIDGE_LEAK: &str = "Refrigerator water leaks usually come from: 1) A clogged defrost drain, \
2) A loose water supply line, 3) A cracked drain pan, 4) A bad water filter. Check these components and replace as needed.";
const FRIDGE_LIGHT: &str = "Refrigerator lights use special appliance bulbs rated for cold temperatures. \
You'll need your refrigerator's model number to find the correct replacement bulb. \
Check inside the fridge or on the door frame for the model number.";
const FRIDGE_GENERAL: &str = "I can help with refrigerator parts! Common issues include cooling problems, water leaks, \
faulty lights, and ice maker issues. Please describe your specific problem and provide your model number \
for accurate part recommendations.";
const WATER_FILTER: &str = "To find the right water filter: 1) Locate your refrigerator's model number \
(inside the fridge or on the door frame), 2) Remove the old filter and check it for part numbers, \
3) Search for compatible filters using the model number. Most filters need replacing every 6 months.";
const DISHWASHER_CLEANING: &str = "For dishwasher cleaning issues: 1) Clean the filter (bottom of the dishwasher), \
2) Check the spray arms for clogs, 3) Use the right amount of detergent, 4) Don't overcrowd the dishes. \
You may need new spray arms or a wash pump motor.";
const DISHWASHER_DRAINAGE: &str = "Dishwasher drainage problems usually need: 1) Cleaning the drain filter, \
2) Checking the garbage disposal connection, 3) Clearing clogs in the drain hose, 4) Replacing the drain pump if needed.";
const DISHWASHER_GENERAL: &str = "I can help with dishwasher parts! Common issues include poor cleaning, \
drainage problems, door seal leaks, and control panel failures. What specific problem are you experiencing?";
const INSTALLATION_HELP: &str = "For installation help, I need to know: 1) What part you're installing, \
2) Your appliance model number, 3) What tools you have available. Most parts come with instructions, \
but I can give specific guidance once I know the details.";
const COMPATIBILITY_HELP: &str = "To check part compatibility, I need: 1) The exact part number, \
2) Your appliance's complete model number. You can find the model number on a sticker inside your appliance \
or on the back or side panel.";
const GREETING: &str = "Hello! I specialize in appliance parts for dishwashers and refrigerators. \
I can help you find parts, check compatibility, and give installation guidance. \
What appliance are you working on today?";
const DEFAULT_HELP: &str = "I'm here to help with appliance parts and repairs! I can assist with dishwashers \
and refrigerators. Please tell me: 1) What type of appliance, 2) What problem you're experiencing, \
3) Your model number if you have it.";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Keyword-table answer. Always non-empty.
pub fn canned_response(query: &str) -> &'static str {
    let q = query.to_lowercase();

    if contains_any(&q, &["refrigerator", "fridge", "cooling", "cold", "temperature"]) {
        if q.contains("not cooling") || q.contains("warm") {
            FRIDGE_COOLING
        } else if q.contains("leaking") || q.contains("water") {
            FRIDGE_LEAK
        } else if q.contains("light") || q.contains("bulb") {
            FRIDGE_LIGHT
        } else {
            FRIDGE_GENERAL
        }
    } else if q.contains("filter") {
        WATER_FILTER
    } else if contains_any(&q, &["dishwasher", "dishes", "washing"]) {
        if q.contains("not cleaning") || q.contains("dirty") {
            DISHWASHER_CLEANING
        } else if q.contains("not draining") || q.contains("water") {
            DISHWASHER_DRAINAGE
        } else {
            DISHWASHER_GENERAL
        }
    } else if contains_any(&q, &["install", "replace", "how to", "installation"]) {
        INSTALLATION_HELP
    } else if contains_any(&q, &["compatible", "fit", "work with"]) {
        COMPATIBILITY_HELP
    } else if q
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| matches!(w, "help" | "hello" | "hi"))
    {
        GREETING
    } else {
        DEFAULT_HELP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partdesk_llm::StaticModel;

    fn corpus() -> Arc<TrainingCorpus> {
        Arc::new(TrainingCorpus::new(vec![
            TrainingExemplar {
                input: "my dishwasher is leaking water from the door".to_string(),
                output: "Check the door gasket and the spray arm seals.".to_string(),
            },
            TrainingExemplar {
                input: "ice maker not making ice".to_string(),
                output: "Check the water inlet valve and the ice maker switch.".to_string(),
            },
            TrainingExemplar {
                input: "blank answer".to_string(),
                output: "   ".to_string(),
            },
        ]))
    }

    fn chain(
        models: Vec<Arc<dyn LanguageModel>>,
        generative: Option<Arc<dyn LanguageModel>>,
    ) -> FallbackChain {
        FallbackChain::new(models, corpus(), generative, FallbackConfig::default())
    }

    fn offline() -> FallbackChain {
        chain(Vec::new(), None)
    }

    // ---- Jaccard ----

    #[test]
    fn test_jaccard_basic() {
        assert!((jaccard_similarity("a b c", "b c d") - 0.5).abs() < 1e-9);
        assert_eq!(jaccard_similarity("Same Words", "same words"), 1.0);
        assert_eq!(jaccard_similarity("", "anything"), 0.0);
        assert_eq!(jaccard_similarity("   ", "   "), 0.0);
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let samples = [
            "",
            "fridge",
            "my fridge is warm",
            "dishwasher not draining water",
            "Water FILTER for my fridge",
        ];
        for a in samples {
            for b in samples {
                assert_eq!(jaccard_similarity(a, b), jaccard_similarity(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    // ---- Training corpus ----

    #[test]
    fn test_domain_boost_is_uncapped() {
        let c = offline();
        let q = "fridge water filter light bulb";
        let i = "fridge water filter light bulb replacement";
        let base = jaccard_similarity(q, i);
        let score = c.training_score(q, i);
        assert!((score - (base + 5.0 * 0.15)).abs() < 1e-9);
        assert!(score > 1.0);
    }

    #[test]
    fn test_best_training_match_above_threshold() {
        let c = offline();
        let (exemplar, score) = c
            .best_training_match("water leaking from my dishwasher")
            .unwrap();
        assert!(score > 0.2);
        assert!(exemplar.output.contains("door gasket"));
    }

    #[test]
    fn test_training_match_skips_blank_outputs() {
        let c = offline();
        assert!(c.best_training_match("blank answer").is_none());
    }

    #[test]
    fn test_training_match_none_below_threshold() {
        assert!(offline().best_training_match("track parcel status").is_none());
    }

    // ---- Stage order ----

    #[tokio::test]
    async fn test_primary_model_answers_first() {
        let a = Arc::new(StaticModel::replying("openai", "Happy to help with that."));
        let b = Arc::new(StaticModel::replying("deepseek", "Second opinion."));
        let c = chain(vec![a.clone(), b.clone()], None);
        let answer = c.answer("what do you sell").await;
        assert_eq!(answer.stage, FallbackStage::Model("openai".to_string()));
        assert_eq!(answer.stage.tag(), "general_openai");
        assert_eq!(b.call_count(), 0);
        assert!(a.prompts()[0].contains("concise, friendly manner: what do you sell"));
    }

    #[tokio::test]
    async fn test_error_reply_rejected() {
        let a = Arc::new(StaticModel::replying("openai", "Error: rate limited"));
        let b = Arc::new(StaticModel::replying("deepseek", "Here you go."));
        let answer = chain(vec![a, b], None).answer("what do you sell").await;
        assert_eq!(answer.stage, FallbackStage::Model("deepseek".to_string()));
        assert_eq!(answer.text, "Here you go.");
    }

    #[tokio::test]
    async fn test_corpus_after_models() {
        let a = Arc::new(StaticModel::unavailable("openai"));
        let b = Arc::new(StaticModel::replying("deepseek", "   "));
        let answer = chain(vec![a, b], None).answer("ice maker not making ice").await;
        assert_eq!(answer.stage, FallbackStage::TrainingCorpus);
        assert_eq!(answer.stage.tag(), "general_smart_fallback");
    }

    #[tokio::test]
    async fn test_generative_gate() {
        let good: Arc<dyn LanguageModel> = Arc::new(StaticModel::replying(
            "local",
            "Try a new dishwasher door latch part.",
        ));
        let answer = chain(Vec::new(), Some(good)).answer("track parcel status").await;
        assert_eq!(answer.stage, FallbackStage::Generative("local".to_string()));
        assert_eq!(answer.stage.tag(), "general_local");

        let off_topic: Arc<dyn LanguageModel> =
            Arc::new(StaticModel::replying("local", "I like turtles very much."));
        let answer = chain(Vec::new(), Some(off_topic)).answer("track parcel status").await;
        assert_eq!(answer.stage, FallbackStage::Canned);

        let denied: Arc<dyn LanguageModel> =
            Arc::new(StaticModel::replying("local", "No idea, maybe a refrigerator part?"));
        let answer = chain(Vec::new(), Some(denied)).answer("track parcel status").await;
        assert_eq!(answer.stage, FallbackStage::Canned);

        let short: Arc<dyn LanguageModel> = Arc::new(StaticModel::replying("local", "a part"));
        let answer = chain(Vec::new(), Some(short)).answer("track parcel status").await;
        assert_eq!(answer.stage, FallbackStage::Canned);
    }

    #[tokio::test]
    async fn test_never_empty() {
        let c = offline();
        for q in ["", " ", "?", "track parcel status", "hello", "ice maker not making ice"] {
            let text = c.resolve(q).await;
            assert!(!text.trim().is_empty(), "empty answer for {q:?}");
        }
    }

    #[tokio::test]
    async fn test_handler_reports_stage_tag() {
        let ctx = ConversationContext::new("t");
        let reply = offline().handle("track parcel status", &ctx).await;
        assert_eq!(reply.agent, "general_smart_fallback_final");
        assert_eq!(reply.text, DEFAULT_HELP);
    }

    // ---- Canned table ----

    #[test]
    fn test_canned_refrigerator_branches() {
        assert_eq!(canned_response("my fridge is warm"), FRIDGE_COOLING);
        assert_eq!(canned_response("refrigerator leaking"), FRIDGE_LEAK);
        assert_eq!(canned_response("fridge light is out"), FRIDGE_LIGHT);
        assert_eq!(canned_response("fridge question"), FRIDGE_GENERAL);
    }

    #[test]
    fn test_canned_other_branches() {
        assert_eq!(canned_response("which water filter"), WATER_FILTER);
        assert_eq!(canned_response("dishwasher leaves dirty plates"), DISHWASHER_CLEANING);
        assert_eq!(canned_response("dishwasher not draining"), DISHWASHER_DRAINAGE);
        assert_eq!(canned_response("dishwasher question"), DISHWASHER_GENERAL);
        assert_eq!(canned_response("how to put in a hinge"), INSTALLATION_HELP);
        assert_eq!(canned_response("is it compatible"), COMPATIBILITY_HELP);
        assert_eq!(canned_response("Hi!"), GREETING);
        assert_eq!(canned_response(""), DEFAULT_HELP);
    }

    #[test]
    fn test_greeting_needs_whole_word() {
        assert_eq!(canned_response("this thing"), DEFAULT_HELP);
        assert_eq!(canned_response("can you help me"), GREETING);
    }
}

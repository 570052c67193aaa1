//! Conversational front end for the parts desk.
//!
//! Per-session conversation state, intent routing, the answer handlers,
//! the fallback chain for open-ended questions, and the orchestrator that
//! ties them together for each incoming message.

pub mod context;
pub mod error;
pub mod fallback;
pub mod handler;
pub mod intent;
pub mod orchestrator;

pub use context::{ContextStore, ConversationContext};
pub use error::ChatError;
pub use fallback::{FallbackAnswer, FallbackChain, FallbackStage};
pub use handler::{HandlerReply, QueryHandler};
pub use intent::{IntentClassifier, IntentRouter, ModelBasedClassifier, RuleBasedClassifier};
pub use orchestrator::{ChatReply, Dispatch, Orchestrator};

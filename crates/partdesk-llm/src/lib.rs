//! External services behind the parts-desk pipeline.
//!
//! Every call to a language model or to the remote catalog comes back as an
//! [`ExternalOutcome`]: a payload, "not available", or a failure reason.
//! Nothing here returns an error to the message pipeline; callers branch on
//! the outcome and move to their next stage.

pub mod catalog_api;
pub mod error;
pub mod mock;
pub mod model;
pub mod outcome;

pub use catalog_api::{CatalogApiClient, CatalogLookup};
pub use error::LlmError;
pub use mock::{StaticCatalog, StaticModel};
pub use model::{ChatModelClient, LanguageModel, SYSTEM_PROMPT};
pub use outcome::ExternalOutcome;

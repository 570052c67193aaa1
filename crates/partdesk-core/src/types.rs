use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Coarse purpose of a customer query. Drives handler dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    /// Looking for a specific part or part details.
    ProductInfo,
    /// Does part X fit model Y.
    Compatibility,
    /// Installing, replacing, repairing, troubleshooting.
    Installation,
    /// Orders, returns, shipping.
    OrderSupport,
    /// Anything else.
    General,
}

impl IntentLabel {
    /// Every label, in declaration order.
    pub const ALL: [IntentLabel; 5] = [
        IntentLabel::ProductInfo,
        IntentLabel::Compatibility,
        IntentLabel::Installation,
        IntentLabel::OrderSupport,
        IntentLabel::General,
    ];

    /// Wire name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentLabel::ProductInfo => "product_info",
            IntentLabel::Compatibility => "compatibility",
            IntentLabel::Installation => "installation",
            IntentLabel::OrderSupport => "order_support",
            IntentLabel::General => "general",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown intent label: {}", s))
    }
}

/// Who authored a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Which resolution stage produced a [`ResolutionResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Part number matched a primary or alternate identifier.
    Exact,
    /// Catalog name or compatible model appeared in the query.
    Keyword,
    /// TF-IDF cosine similarity above threshold.
    Semantic,
    /// Returned by the external catalog service.
    External,
    /// Nothing matched.
    None,
}

// =============================================================================
// Catalog records
// =============================================================================

/// One catalog entry.
///
/// Field names on disk follow the catalog export format (`part_number`,
/// `alt_numbers`, `model_compatibility`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Primary part number.
    #[serde(rename = "part_number")]
    pub identifier: String,
    /// Superseded or cross-reference part numbers.
    #[serde(rename = "alt_numbers", default)]
    pub alternate_identifiers: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Appliance model numbers this part is listed for.
    #[serde(rename = "model_compatibility", default)]
    pub compatible_models: Vec<String>,
    #[serde(rename = "installation", default)]
    pub installation_text: Option<String>,
    /// Step-by-step instructions, when the export has them separately.
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(rename = "image_url", default)]
    pub image_ref: Option<String>,
}

impl ProductRecord {
    /// Case-insensitive match against the primary or any alternate identifier.
    pub fn matches_identifier(&self, id: &str) -> bool {
        let wanted = id.to_uppercase();
        self.identifier.to_uppercase() == wanted
            || self
                .alternate_identifiers
                .iter()
                .any(|alt| alt.to_uppercase() == wanted)
    }

    /// Case-insensitive membership of `model` in the compatible-model set.
    pub fn fits_model(&self, model: &str) -> bool {
        let wanted = model.to_uppercase();
        self.compatible_models
            .iter()
            .any(|m| m.to_uppercase() == wanted)
    }

    /// Text used for semantic indexing: name, description, instructions,
    /// installation text, newline-joined, empty parts skipped.
    pub fn search_text(&self) -> String {
        [
            Some(self.name.as_str()),
            Some(self.description.as_str()),
            self.instructions.as_deref(),
            self.installation_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }

    /// Installation guidance, preferring dedicated instructions.
    pub fn install_guidance(&self) -> Option<&str> {
        self.instructions
            .as_deref()
            .or(self.installation_text.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// One input/output pair from the support-conversation corpus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExemplar {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
}

// =============================================================================
// Resolution
// =============================================================================

/// Outcome of a product lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub record: Option<ProductRecord>,
    /// 1.0 for exact, keyword and external matches; cosine similarity for
    /// semantic matches; 0.0 when nothing matched.
    pub confidence: f64,
    pub source: ResolutionSource,
}

impl ResolutionResult {
    /// A match with the given confidence.
    pub fn found(record: ProductRecord, confidence: f64, source: ResolutionSource) -> Self {
        Self {
            record: Some(record),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    /// The "nothing matched" result.
    pub fn not_found() -> Self {
        Self {
            record: None,
            confidence: 0.0,
            source: ResolutionSource::None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.record.is_some()
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// A single message in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

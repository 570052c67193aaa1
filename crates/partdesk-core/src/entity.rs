//! Part and model identifier extraction from conversation text.

use std::sync::LazyLock;

use regex::Regex;

/// Catalog part-number grammar: `PS` + digits, `WP` + alphanumerics,
/// `W` + at least five digits.
static PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(PS\d+|WP[A-Z0-9]+|W\d{5,})\b").expect("Invalid part-number regex")
});

/// Any alphanumeric token with at least one digit.
static MODEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Z]*\d+[A-Z0-9]*\b").expect("Invalid model-number regex")
});

/// Identifiers found in a conversation window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    /// First part number in scan order, as written.
    pub part_id: Option<String>,
    /// First digit-bearing token that is not the part number, as written.
    pub model_id: Option<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.part_id.is_none() && self.model_id.is_none()
    }
}

/// Extracts part and model identifiers from free text.
///
/// Callers pass the whole conversation window, not just the latest message,
/// so a part number from an earlier turn pairs with a model number given
/// later.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the first part number and first model candidate.
    pub fn extract(&self, window: &str) -> ExtractedEntities {
        let part_id = self.find_part_id(window);
        let model_id = MODEL_RE
            .find_iter(window)
            .map(|m| m.as_str())
            .find(|token| match part_id {
                Some(ref part) => !token.eq_ignore_ascii_case(part),
                None => true,
            })
            .map(str::to_string);

        ExtractedEntities { part_id, model_id }
    }

    /// First part number in `text`, as written.
    pub fn find_part_id(&self, text: &str) -> Option<String> {
        PART_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Whether `text` contains anything shaped like a part number.
    pub fn has_part_id(&self, text: &str) -> bool {
        PART_RE.is_match(text)
    }
}

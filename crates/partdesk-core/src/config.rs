use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PartdeskError, Result};

/// Top-level configuration for the parts desk.
///
/// Loaded from `~/.partdesk/config.toml` by default. Credentials never live
/// in this file: sections that talk to external services name the
/// environment variable holding the key, and an unset variable means the
/// service is simply not configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartdeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub catalog_api: CatalogApiConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl PartdeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PartdeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PartdeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// JSON array of product records.
    pub catalog_path: String,
    /// JSON array of `{input, output}` exemplars.
    pub training_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            catalog_path: "data/products.json".to_string(),
            training_path: "data/training_conversations.json".to_string(),
        }
    }
}

/// The three language-model endpoints the pipeline knows about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// First responder in the fallback chain and first classifier.
    pub primary: ModelEndpointConfig,
    /// Second responder, tried when the primary yields nothing usable.
    pub secondary: ModelEndpointConfig,
    /// Best-effort generative responder behind the training-corpus match.
    pub generative: ModelEndpointConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            primary: ModelEndpointConfig {
                label: "openai".to_string(),
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                ..ModelEndpointConfig::default()
            },
            secondary: ModelEndpointConfig {
                label: "deepseek".to_string(),
                endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
                model: "deepseek-chat".to_string(),
                api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
                ..ModelEndpointConfig::default()
            },
            generative: ModelEndpointConfig {
                label: "local".to_string(),
                endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
                model: "llama3.2".to_string(),
                api_key_env: None,
                enabled: false,
                ..ModelEndpointConfig::default()
            },
        }
    }
}

/// One OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelEndpointConfig {
    /// Short name used in agent tags and logs.
    pub label: String,
    /// Full chat-completions URL.
    pub endpoint: String,
    /// Model name sent in the request body.
    pub model: String,
    /// Environment variable holding the bearer key. `None` means the
    /// endpoint needs no key (a local server).
    pub api_key_env: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: f32,
    /// Hard switch, independent of credentials.
    pub enabled: bool,
}

impl Default for ModelEndpointConfig {
    fn default() -> Self {
        Self {
            label: "model".to_string(),
            endpoint: String::new(),
            model: String::new(),
            api_key_env: None,
            timeout_secs: 10,
            temperature: 0.2,
            enabled: true,
        }
    }
}

impl ModelEndpointConfig {
    /// Read the bearer key from the environment, if one is named and set.
    pub fn resolve_api_key(&self) -> Option<String> {
        read_env(self.api_key_env.as_deref())
    }

    /// Whether this endpoint should be called, given the key resolved for it.
    ///
    /// Enabled, with a URL, and either keyless or holding a key.
    pub fn is_callable_with(&self, api_key: Option<&str>) -> bool {
        self.enabled
            && !self.endpoint.is_empty()
            && (self.api_key_env.is_none() || api_key.is_some())
    }
}

/// External product-catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogApiConfig {
    /// Base URL used when `base_url_env` is unset.
    pub base_url: String,
    /// Environment variable that overrides `base_url`.
    pub base_url_env: Option<String>,
    /// Environment variable holding the bearer key.
    pub api_key_env: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CatalogApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.partselect.com".to_string(),
            base_url_env: Some("PARTSELECT_API_URL".to_string()),
            api_key_env: Some("PARTSELECT_API_KEY".to_string()),
            timeout_secs: 5,
        }
    }
}

impl CatalogApiConfig {
    /// Base URL after applying the environment override.
    pub fn resolve_base_url(&self) -> String {
        read_env(self.base_url_env.as_deref()).unwrap_or_else(|| self.base_url.clone())
    }

    /// Bearer key from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        read_env(self.api_key_env.as_deref())
    }
}

/// Product resolution thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Semantic matches must score strictly above this.
    pub semantic_threshold: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: 0.1,
        }
    }
}

/// Conversation-window extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Include assistant turns in the extraction window.
    ///
    /// A part found by name is only ever numbered in the assistant's answer.
    /// That answer also lists compatible models, which win over a model the
    /// customer types afterwards.
    pub include_assistant_turns: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_assistant_turns: true,
        }
    }
}

/// Fallback-chain tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Training-corpus matches must score strictly above this.
    pub similarity_threshold: f64,
    /// Added per domain term present in both query and exemplar. Uncapped.
    pub domain_boost: f64,
    /// Generative replies must be longer than this many characters.
    pub generative_min_length: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.2,
            domain_boost: 0.15,
            generative_min_length: 10,
        }
    }
}

/// Per-message limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longer messages get a "please shorten" reply instead of routing.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
        }
    }
}

fn read_env(var: Option<&str>) -> Option<String> {
    let var = var?;
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = PartdeskConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.catalog_path, "data/products.json");
        assert_eq!(config.models.primary.label, "openai");
        assert_eq!(config.models.secondary.label, "deepseek");
        assert!(!config.models.generative.enabled);
        assert_eq!(config.models.primary.timeout_secs, 10);
        assert_eq!(config.catalog_api.timeout_secs, 5);
        assert_eq!(config.resolution.semantic_threshold, 0.1);
        assert_eq!(config.fallback.similarity_threshold, 0.2);
        assert_eq!(config.fallback.domain_boost, 0.15);
        assert!(config.extraction.include_assistant_turns);
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"
catalog_path = "/srv/parts/products.json"

[models.primary]
label = "openai"
endpoint = "https://example.test/v1/chat/completions"
model = "gpt-4o-mini"
api_key_env = "TEST_PARTDESK_KEY"
timeout_secs = 3

[extraction]
include_assistant_turns = false

[fallback]
similarity_threshold = 0.3
"#;
        let file = create_temp_config(content);
        let config = PartdeskConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.catalog_path, "/srv/parts/products.json");
        // Unset fields in a present section keep their defaults.
        assert_eq!(
            config.general.training_path,
            "data/training_conversations.json"
        );
        assert_eq!(config.models.primary.model, "gpt-4o-mini");
        assert_eq!(config.models.primary.timeout_secs, 3);
        assert_eq!(config.models.primary.temperature, 0.2);
        // Absent sections keep their defaults.
        assert_eq!(config.models.secondary.label, "deepseek");
        assert_eq!(config.fallback.similarity_threshold, 0.3);
        assert_eq!(config.fallback.domain_boost, 0.15);
        assert!(!config.extraction.include_assistant_turns);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is not [valid toml");
        let result = PartdeskConfig::load(file.path());
        assert!(matches!(result, Err(PartdeskError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = PartdeskConfig::load(Path::new("/nonexistent/partdesk.toml"));
        assert!(matches!(result, Err(PartdeskError::Io(_))));
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = PartdeskConfig::default();
        config.general.log_level = "trace".to_string();
        config.models.generative.enabled = true;
        config.save(&path).unwrap();

        let loaded = PartdeskConfig::load(&path).unwrap();
        assert_eq!(loaded.general.log_level, "trace");
        assert!(loaded.models.generative.enabled);
        assert_eq!(loaded.models.generative.api_key_env, None);
    }

    #[test]
    fn test_keyless_endpoint_is_callable_when_enabled() {
        let mut endpoint = ModelsConfig::default().generative;
        assert!(!endpoint.is_callable_with(None));
        endpoint.enabled = true;
        assert!(endpoint.is_callable_with(None));
    }

    #[test]
    fn test_keyed_endpoint_requires_env_var() {
        let endpoint = ModelEndpointConfig {
            endpoint: "https://example.test".to_string(),
            api_key_env: Some("PARTDESK_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..ModelEndpointConfig::default()
        };
        assert!(endpoint.resolve_api_key().is_none());
        assert!(!endpoint.is_callable_with(endpoint.resolve_api_key().as_deref()));
        assert!(endpoint.is_callable_with(Some("sk-test")));
    }

    #[test]
    fn test_endpoint_without_url_is_not_callable() {
        let endpoint = ModelEndpointConfig::default();
        assert!(!endpoint.is_callable_with(Some("sk-test")));
    }

    #[test]
    fn test_catalog_api_base_url_default() {
        let api = CatalogApiConfig {
            base_url_env: Some("PARTDESK_TEST_URL_THAT_IS_NEVER_SET".to_string()),
            ..CatalogApiConfig::default()
        };
        assert_eq!(api.resolve_base_url(), "https://api.partselect.com");
    }
}

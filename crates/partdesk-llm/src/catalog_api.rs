//! Remote product-catalog lookups by part number.

use std::time::Duration;

use async_trait::async_trait;
use partdesk_core::config::CatalogApiConfig;
use partdesk_core::ProductRecord;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::outcome::ExternalOutcome;

/// Something that can fetch a single product by part number.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Whether a lookup could possibly succeed.
    fn is_configured(&self) -> bool;

    /// Fetch one part. A 404 is `Failed`, a missing key is `Unavailable`.
    async fn fetch_part(&self, part_id: &str) -> ExternalOutcome<ProductRecord>;
}

/// Wire shape of `GET /parts/{id}`.
#[derive(Debug, Deserialize)]
struct ApiPart {
    #[serde(default)]
    part_number: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    models: Vec<String>,
    #[serde(default)]
    installation_instructions: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl ApiPart {
    /// Map onto a catalog record, falling back to the requested id when the
    /// response omits its own part number.
    fn into_record(self, requested_id: &str) -> ProductRecord {
        let identifier = self
            .part_number
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| requested_id.to_string());
        ProductRecord {
            name: self.name.unwrap_or_else(|| identifier.clone()),
            identifier,
            alternate_identifiers: Vec::new(),
            description: self.description.unwrap_or_default(),
            compatible_models: self.models,
            installation_text: self.installation_instructions,
            instructions: None,
            image_ref: self.image_url,
        }
    }
}

/// HTTP client for the remote catalog service.
#[derive(Clone)]
pub struct CatalogApiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CatalogApiClient {
    /// Build from config. Base URL and key are read from the environment
    /// once, here.
    pub fn from_config(config: &CatalogApiConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ClientBuild(e.to_string()))?;

        Ok(Self {
            base_url: config.resolve_base_url().trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call_api(&self, part_id: &str) -> Result<ProductRecord, LlmError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::NotConfigured("catalog api".to_string()))?;

        let url = format!("{}/parts/{}", self.base_url, part_id);
        let response = self.client.get(&url).bearer_auth(key).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let part: ApiPart = response.json().await?;
        Ok(part.into_record(part_id))
    }
}

#[async_trait]
impl CatalogLookup for CatalogApiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_part(&self, part_id: &str) -> ExternalOutcome<ProductRecord> {
        let result = self.call_api(part_id).await;
        match &result {
            Ok(record) => info!(part = %record.identifier, "Fetched part from catalog API"),
            Err(LlmError::NotConfigured(_)) => debug!("Catalog API key not set, skipping lookup"),
            Err(e) => debug!(part = %part_id, error = %e, "Catalog API lookup failed"),
        }
        result.into()
    }
}

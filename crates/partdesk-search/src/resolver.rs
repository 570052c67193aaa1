//! Ranked product lookup: exact identifier, catalog keyword, semantic
//! similarity, then the remote catalog service.

use std::sync::Arc;

use partdesk_core::config::ResolutionConfig;
use partdesk_core::{Catalog, EntityExtractor, ProductRecord, ResolutionResult, ResolutionSource};
use partdesk_llm::{CatalogLookup, ExternalOutcome};
use tracing::{debug, info};

use crate::tfidf::TfidfIndex;

/// Resolves a customer query to at most one catalog record.
///
/// Stages run in order and stop at the first hit. The TF-IDF index is built
/// once in [`new`](Self::new) from the catalog's search text.
pub struct ProductResolutionEngine {
    catalog: Arc<Catalog>,
    index: TfidfIndex,
    remote: Arc<dyn CatalogLookup>,
    extractor: EntityExtractor,
    semantic_threshold: f64,
}

impl ProductResolutionEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        remote: Arc<dyn CatalogLookup>,
        config: &ResolutionConfig,
    ) -> Self {
        let texts: Vec<String> = catalog.iter().map(ProductRecord::search_text).collect();
        let index = TfidfIndex::build(&texts);
        info!(
            records = catalog.len(),
            terms = index.vocabulary_size(),
            "Semantic index built"
        );

        Self {
            catalog,
            index,
            remote,
            extractor: EntityExtractor::new(),
            semantic_threshold: config.semantic_threshold,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve `query`, using `window` (the conversation so far, including
    /// this query) to find a part number mentioned in an earlier turn.
    pub async fn resolve(&self, query: &str, window: &str) -> ResolutionResult {
        let part_id = self
            .extractor
            .find_part_id(window)
            .or_else(|| self.extractor.find_part_id(query));

        if let Some(id) = part_id.as_deref() {
            if let Some(record) = self.exact_match(id) {
                debug!(part = %id, "Exact identifier match");
                return ResolutionResult::found(record.clone(), 1.0, ResolutionSource::Exact);
            }
        }

        if let Some(record) = self.keyword_match(query) {
            debug!(part = %record.identifier, "Keyword match");
            return ResolutionResult::found(record.clone(), 1.0, ResolutionSource::Keyword);
        }

        if let Some((record, score)) = self.semantic_match(query) {
            debug!(part = %record.identifier, score, "Semantic match");
            return ResolutionResult::found(record.clone(), score, ResolutionSource::Semantic);
        }

        match part_id {
            Some(id) => self.fetch_remote(&id).await,
            None => ResolutionResult::not_found(),
        }
    }

    /// Look up a known part number: local catalog first, then the remote
    /// service.
    pub async fn resolve_part(&self, part_id: &str) -> ResolutionResult {
        match self.exact_match(part_id) {
            Some(record) => ResolutionResult::found(record.clone(), 1.0, ResolutionSource::Exact),
            None => self.fetch_remote(part_id).await,
        }
    }

    /// Record whose primary or alternate identifier equals `part_id`,
    /// ignoring case.
    pub fn exact_match(&self, part_id: &str) -> Option<&ProductRecord> {
        self.catalog.find_by_identifier(&part_id.to_uppercase())
    }

    /// First record, in catalog order, whose name or any compatible model
    /// appears inside the query. Blank names and models never match.
    pub fn keyword_match(&self, query: &str) -> Option<&ProductRecord> {
        let q = query.to_lowercase();
        self.catalog.iter().find(|record| {
            let name = record.name.to_lowercase();
            (!name.trim().is_empty() && q.contains(&name))
                || record.compatible_models.iter().any(|model| {
                    let model = model.to_lowercase();
                    !model.trim().is_empty() && q.contains(&model)
                })
        })
    }

    /// Best TF-IDF match, only if strictly above the configured threshold.
    pub fn semantic_match(&self, query: &str) -> Option<(&ProductRecord, f64)> {
        let best = self.index.best_match(query)?;
        if best.score <= self.semantic_threshold {
            debug!(score = best.score, threshold = self.semantic_threshold, "Semantic match below threshold");
            return None;
        }
        self.catalog.get(best.index).map(|record| (record, best.score))
    }

    async fn fetch_remote(&self, part_id: &str) -> ResolutionResult {
        match self.remote.fetch_part(part_id).await {
            ExternalOutcome::Success(record) => {
                ResolutionResult::found(record, 1.0, ResolutionSource::External)
            }
            ExternalOutcome::Unavailable => {
                debug!(part = %part_id, "Remote catalog unavailable");
                ResolutionResult::not_found()
            }
            ExternalOutcome::Failed(reason) => {
                debug!(part = %part_id, reason = %reason, "Remote catalog lookup failed");
                ResolutionResult::not_found()
            }
        }
    }
}

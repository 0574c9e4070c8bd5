//! Extraction → registry → profile → matcher → scorer, per (tender, bidder) pair.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use super::domain::BidderId;
use super::extraction::{extract, TextSegment, UnreadableDocumentError};
use super::matching::{ComplianceMatcher, MatchingConfig};
use super::profile::{ProfileResolver, RegistryLookup};
use super::registry::{build_registry, RegistryError, RequirementRegistry};
use super::scoring::{score, EvaluationResult, ScoringError};
use crate::config::EngineConfig;

/// Tunables for one evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub matching: MatchingConfig,
    pub lookup_timeout: Duration,
    /// Registry lookups allowed in flight at once.
    pub lookup_concurrency: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default())
    }
}

impl EvaluationConfig {
    pub fn from_engine(engine: &EngineConfig) -> Self {
        Self {
            matching: MatchingConfig::default(),
            lookup_timeout: engine.lookup_timeout,
            lookup_concurrency: engine.lookup_concurrency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("tender document unreadable: {0}")]
    Tender(#[source] UnreadableDocumentError),
    #[error("proposal document unreadable: {0}")]
    Proposal(#[source] UnreadableDocumentError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EvaluationError {
    /// Failures caused by the submitted documents rather than the engine.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EvaluationError::Tender(_) | EvaluationError::Proposal(_) | EvaluationError::Registry(_)
        )
    }
}

/// Runs evaluations. Cheap to clone; clones share the lookup limiter.
#[derive(Clone)]
pub struct TenderEvaluator {
    matcher: ComplianceMatcher,
    resolver: ProfileResolver,
    lookup_permits: Arc<Semaphore>,
}

impl TenderEvaluator {
    pub fn new(lookup: Arc<dyn RegistryLookup>, config: EvaluationConfig) -> Self {
        Self {
            matcher: ComplianceMatcher::new(config.matching),
            resolver: ProfileResolver::new(lookup, config.lookup_timeout),
            lookup_permits: Arc::new(Semaphore::new(config.lookup_concurrency.max(1))),
        }
    }

    /// Extract the tender and build its registry. Fatal on unreadable input.
    pub fn build_registry(&self, tender: &[u8]) -> Result<RequirementRegistry, EvaluationError> {
        let document = extract(tender).map_err(EvaluationError::Tender)?;
        let registry = build_registry(document.segments())?;
        info!(
            pages = document.page_count(),
            requirements = registry.len(),
            mandatory = registry.mandatory_count(),
            "requirement registry built"
        );
        Ok(registry)
    }

    /// Evaluate one proposal against an already built registry.
    pub async fn evaluate_bidder(
        &self,
        bidder_id: BidderId,
        registry: &RequirementRegistry,
        proposal: &[u8],
    ) -> Result<EvaluationResult, EvaluationError> {
        let document = extract(proposal).map_err(EvaluationError::Proposal)?;
        let segments: Vec<TextSegment> = document.segments().collect();
        info!(
            bidder_id = %bidder_id,
            segments = segments.len(),
            "evaluation started"
        );

        let resolution = {
            let _permit = self
                .lookup_permits
                .acquire()
                .await
                .map_err(|_| EvaluationError::Cancelled)?;
            self.resolver
                .resolve(&segments, registry.contract_purpose())
                .await
        };

        let outcomes = self.matcher.match_requirements(registry, &segments);
        let result = score(bidder_id, outcomes, resolution, registry)?;
        Ok(result)
    }

    /// Single (tender, proposal) run.
    pub async fn evaluate(
        &self,
        bidder_id: BidderId,
        tender: &[u8],
        proposal: &[u8],
    ) -> Result<EvaluationResult, EvaluationError> {
        let registry = self.build_registry(tender)?;
        self.evaluate_bidder(bidder_id, &registry, proposal).await
    }

    /// Evaluate several proposals concurrently against one shared registry.
    /// Results keep input order; a task that never reports back counts as
    /// cancelled.
    pub async fn evaluate_all(
        &self,
        registry: Arc<RequirementRegistry>,
        proposals: Vec<(BidderId, Vec<u8>)>,
    ) -> Vec<(BidderId, Result<EvaluationResult, EvaluationError>)> {
        let ids: Vec<BidderId> = proposals.iter().map(|(id, _)| id.clone()).collect();
        let mut set = JoinSet::new();

        for (position, (bidder_id, proposal)) in proposals.into_iter().enumerate() {
            let evaluator = self.clone();
            let registry = Arc::clone(&registry);
            set.spawn(async move {
                let result = evaluator
                    .evaluate_bidder(bidder_id, &registry, &proposal)
                    .await;
                (position, result)
            });
        }

        let mut slots: Vec<Option<Result<EvaluationResult, EvaluationError>>> =
            ids.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            if let Ok((position, result)) = joined {
                slots[position] = Some(result);
            }
        }

        ids.into_iter()
            .zip(slots)
            .map(|(id, slot)| (id, slot.unwrap_or(Err(EvaluationError::Cancelled))))
            .collect()
    }
}

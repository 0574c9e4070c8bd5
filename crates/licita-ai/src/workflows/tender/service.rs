use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::task::AbortHandle;
use tracing::{info, warn};

use super::domain::BidderId;
use super::pipeline::{EvaluationConfig, EvaluationError, TenderEvaluator};
use super::profile::{LookupFailure, RegistryLookup, RegistryRecord};
use super::registry::RequirementRegistry;
use super::repository::{EvaluationRecord, EvaluationRepository, EvaluationStatus, RepositoryError};
use super::scoring::EvaluationResult;

/// Two documents and an optional caller-chosen identifier.
#[derive(Debug, Clone)]
pub struct BidSubmission {
    pub bidder_id: Option<String>,
    pub tender: Vec<u8>,
    pub proposal: Vec<u8>,
}

type RegistryCache = RwLock<HashMap<String, Arc<RequirementRegistry>>>;
type InFlight = Mutex<HashMap<BidderId, AbortHandle>>;

/// Queues evaluations in the background and tracks them in the repository.
pub struct BidEvaluationService<R> {
    repository: Arc<R>,
    evaluator: TenderEvaluator,
    lookup: Arc<dyn RegistryLookup>,
    lookup_timeout: Duration,
    registries: Arc<RegistryCache>,
    in_flight: Arc<InFlight>,
}

static BIDDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_bidder_id() -> BidderId {
    let id = BIDDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BidderId(format!("oferente-{id:06}"))
}

fn tender_digest(tender: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tender);
    format!("{:x}", hasher.finalize())
}

fn lock_in_flight(in_flight: &InFlight) -> MutexGuard<'_, HashMap<BidderId, AbortHandle>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R> BidEvaluationService<R>
where
    R: EvaluationRepository + 'static,
{
    pub fn new(repository: Arc<R>, lookup: Arc<dyn RegistryLookup>, config: EvaluationConfig) -> Self {
        let lookup_timeout = config.lookup_timeout;
        Self {
            repository,
            evaluator: TenderEvaluator::new(Arc::clone(&lookup), config),
            lookup,
            lookup_timeout,
            registries: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store a pending record and start the run. Returns before evaluating.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, submission: BidSubmission) -> Result<EvaluationRecord, ServiceError> {
        let bidder_id = submission
            .bidder_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .map(BidderId)
            .unwrap_or_else(next_bidder_id);

        let stored = self
            .repository
            .insert(EvaluationRecord::pending(bidder_id.clone()))?;
        info!(bidder_id = %bidder_id, "evaluation queued");

        let task = EvaluationTask {
            bidder_id: bidder_id.clone(),
            repository: Arc::clone(&self.repository),
            evaluator: self.evaluator.clone(),
            registries: Arc::clone(&self.registries),
            in_flight: Arc::clone(&self.in_flight),
        };

        // Held across spawn so the task cannot finish before it is tracked.
        let mut in_flight = lock_in_flight(&self.in_flight);
        let handle = tokio::spawn(task.run(submission.tender, submission.proposal));
        in_flight.insert(bidder_id, handle.abort_handle());

        Ok(stored)
    }

    pub fn get(&self, bidder_id: &BidderId) -> Result<EvaluationRecord, ServiceError> {
        let record = self
            .repository
            .fetch(bidder_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Finished evaluations in submission order.
    pub fn list_evaluated(&self) -> Result<Vec<EvaluationResult>, ServiceError> {
        let records = self.repository.evaluated()?;
        Ok(records
            .into_iter()
            .filter_map(|record| record.result)
            .collect())
    }

    /// Abort an in-flight run. Its partial work is discarded.
    pub fn cancel(&self, bidder_id: &BidderId) -> Result<EvaluationRecord, ServiceError> {
        let mut in_flight = lock_in_flight(&self.in_flight);
        let Some(handle) = in_flight.remove(bidder_id) else {
            let record = self.get(bidder_id)?;
            return Err(ServiceError::NotCancellable {
                bidder_id: bidder_id.clone(),
                status: record.status.label(),
            });
        };
        handle.abort();

        let mut record = self
            .repository
            .fetch(bidder_id)?
            .ok_or(RepositoryError::NotFound)?;
        record.status = EvaluationStatus::Cancelled;
        record.completed_at = Some(Utc::now());
        self.repository.update(record.clone())?;
        info!(bidder_id = %bidder_id, "evaluation cancelled");
        Ok(record)
    }

    /// Direct registry lookup under the configured timeout.
    pub async fn lookup_registry(&self, tax_id: &str) -> Result<RegistryRecord, ServiceError> {
        let lookup = tokio::time::timeout(self.lookup_timeout, self.lookup.lookup(tax_id));
        match lookup.await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServiceError::Lookup(LookupFailure::Timeout {
                after_ms: self.lookup_timeout.as_millis() as u64,
            })),
        }
    }

    /// Registries built so far, keyed by tender digest.
    pub fn cached_registries(&self) -> usize {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct EvaluationTask<R> {
    bidder_id: BidderId,
    repository: Arc<R>,
    evaluator: TenderEvaluator,
    registries: Arc<RegistryCache>,
    in_flight: Arc<InFlight>,
}

impl<R> EvaluationTask<R>
where
    R: EvaluationRepository + 'static,
{
    async fn run(self, tender: Vec<u8>, proposal: Vec<u8>) {
        let outcome = match self.registry_for(&tender) {
            Ok(registry) => {
                self.evaluator
                    .evaluate_bidder(self.bidder_id.clone(), &registry, &proposal)
                    .await
            }
            Err(err) => Err(err),
        };

        let mut in_flight = lock_in_flight(&self.in_flight);
        if in_flight.remove(&self.bidder_id).is_none() {
            // Cancelled while finishing; the cancel already settled the record.
            return;
        }
        if let Err(err) = self.settle(outcome) {
            warn!(bidder_id = %self.bidder_id, error = %err, "failed to store evaluation");
        }
    }

    fn registry_for(&self, tender: &[u8]) -> Result<Arc<RequirementRegistry>, EvaluationError> {
        let digest = tender_digest(tender);
        if let Some(registry) = self
            .registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&digest)
        {
            return Ok(Arc::clone(registry));
        }

        let registry = Arc::new(self.evaluator.build_registry(tender)?);
        let mut cache = self.registries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(digest).or_insert(registry)))
    }

    fn settle(
        &self,
        outcome: Result<EvaluationResult, EvaluationError>,
    ) -> Result<(), RepositoryError> {
        let mut record = self
            .repository
            .fetch(&self.bidder_id)?
            .ok_or(RepositoryError::NotFound)?;
        record.completed_at = Some(Utc::now());
        match outcome {
            Ok(result) => {
                record.status = EvaluationStatus::Evaluated;
                record.result = Some(result);
            }
            Err(err) => {
                warn!(bidder_id = %self.bidder_id, error = %err, "evaluation failed");
                record.status = EvaluationStatus::Failed;
                record.failure = Some(err.to_string());
            }
        }
        self.repository.update(record)
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Lookup(#[from] LookupFailure),
    #[error("evaluation {bidder_id} is {status} and cannot be cancelled")]
    NotCancellable {
        bidder_id: BidderId,
        status: &'static str,
    },
}

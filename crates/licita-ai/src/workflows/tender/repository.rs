use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{BidderId, RiskLevel};
use super::scoring::EvaluationResult;

/// Lifecycle of one submitted evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Pending,
    Evaluated,
    Failed,
    Cancelled,
}

impl EvaluationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Evaluated => "evaluated",
            EvaluationStatus::Failed => "failed",
            EvaluationStatus::Cancelled => "cancelled",
        }
    }
}

/// Repository record tracking a run and, once finished, its result.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub bidder_id: BidderId,
    pub status: EvaluationStatus,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<EvaluationResult>,
    pub failure: Option<String>,
}

impl EvaluationRecord {
    pub fn pending(bidder_id: BidderId) -> Self {
        Self {
            bidder_id,
            status: EvaluationStatus::Pending,
            submitted_at: Utc::now(),
            completed_at: None,
            result: None,
            failure: None,
        }
    }

    pub fn status_view(&self) -> EvaluationStatusView {
        EvaluationStatusView {
            id: self.bidder_id.clone(),
            status: self.status.label(),
            submitted_at: self.submitted_at,
            completed_at: self.completed_at,
            score_cumplimiento: self.result.as_ref().map(EvaluationResult::compliance_score),
            nivel_riesgo: self.result.as_ref().map(EvaluationResult::risk_level),
            error: self.failure.clone(),
        }
    }
}

/// Storage abstraction so the service can be exercised in isolation.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError>;
    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BidderId) -> Result<Option<EvaluationRecord>, RepositoryError>;
    /// Records with status `Evaluated`, oldest submission first.
    fn evaluated(&self) -> Result<Vec<EvaluationRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Status payload returned while a run is queued or when it did not finish.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationStatusView {
    pub id: BidderId,
    pub status: &'static str,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_cumplimiento: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nivel_riesgo: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

//! Coherence and risk scoring over matcher outcomes.

mod coherence;
mod risk;

pub use coherence::{activity_coherent, purpose_category, PurposeCategory};
pub use risk::{compliance_score, risk_level};

use serde::Serialize;
use tracing::info;

use super::domain::{
    BidderId, BidderProfile, EvaluationWarning, RequirementOutcome, RequirementStatus, RiskLevel,
};
use super::profile::{LookupFailure, ProfileResolution};
use super::registry::RequirementRegistry;

/// Final per-bidder artifact. Only [`score`] builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    bidder_id: BidderId,
    profile: BidderProfile,
    outcomes: Vec<RequirementOutcome>,
    compliance_score: u8,
    activity_coherent: bool,
    warnings: Vec<EvaluationWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lookup_failure: Option<LookupFailure>,
}

impl EvaluationResult {
    pub fn bidder_id(&self) -> &BidderId {
        &self.bidder_id
    }

    pub fn profile(&self) -> &BidderProfile {
        &self.profile
    }

    pub fn outcomes(&self) -> &[RequirementOutcome] {
        &self.outcomes
    }

    /// Statuses in registry order.
    pub fn requirement_statuses(&self) -> Vec<RequirementStatus> {
        self.outcomes.iter().map(|outcome| outcome.status).collect()
    }

    pub fn compliance_score(&self) -> u8 {
        self.compliance_score
    }

    pub fn activity_coherent(&self) -> bool {
        self.activity_coherent
    }

    pub fn risk_level(&self) -> RiskLevel {
        risk_level(self.compliance_score, self.activity_coherent)
    }

    pub fn warnings(&self) -> &[EvaluationWarning] {
        &self.warnings
    }

    pub fn lookup_failure(&self) -> Option<&LookupFailure> {
        self.lookup_failure.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("expected {expected} requirement outcomes, got {actual}")]
    StatusCountMismatch { expected: usize, actual: usize },
}

/// Score a bidder. The compliance denominator counts mandatory requirements
/// only; a registry without any falls back to all of them.
pub fn score(
    bidder_id: BidderId,
    outcomes: Vec<RequirementOutcome>,
    resolution: ProfileResolution,
    registry: &RequirementRegistry,
) -> Result<EvaluationResult, ScoringError> {
    if outcomes.len() != registry.len() {
        return Err(ScoringError::StatusCountMismatch {
            expected: registry.len(),
            actual: outcomes.len(),
        });
    }

    let mandatory: Vec<RequirementStatus> = outcomes
        .iter()
        .filter(|outcome| outcome.requirement.mandatory)
        .map(|outcome| outcome.status)
        .collect();
    let compliance_score = if mandatory.is_empty() {
        let all: Vec<RequirementStatus> = outcomes.iter().map(|outcome| outcome.status).collect();
        risk::compliance_score(&all)
    } else {
        risk::compliance_score(&mandatory)
    };

    let ProfileResolution {
        profile,
        lookup_failure,
    } = resolution;
    let assessment = coherence::assess(
        profile.declared_activity.as_deref(),
        profile.contract_purpose.as_deref(),
    );

    let mut warnings = registry.warnings().to_vec();
    warnings.extend(assessment.warning);

    let result = EvaluationResult {
        bidder_id,
        profile,
        outcomes,
        compliance_score,
        activity_coherent: assessment.coherent,
        warnings,
        lookup_failure,
    };

    info!(
        bidder_id = %result.bidder_id,
        score = result.compliance_score,
        coherent = result.activity_coherent,
        risk = result.risk_level().label(),
        "bidder scored"
    );
    Ok(result)
}

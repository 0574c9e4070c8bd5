//! Compliance matcher: per requirement, evidence search and three-state verdict.

mod config;
mod policy;
pub(crate) mod terms;

pub use config::MatchingConfig;

use tracing::debug;

use super::domain::{Evidence, Requirement, RequirementOutcome, RequirementStatus};
use super::extraction::TextSegment;
use super::registry::RequirementRegistry;
use policy::{Conflict, RequirementConstraints};
use terms::{candidates, Candidate, KeyTerms};

const SNIPPET_CHARS: usize = 160;

/// Stateless matcher applying the confidence thresholds to a proposal.
#[derive(Debug, Clone)]
pub struct ComplianceMatcher {
    config: MatchingConfig,
}

struct Scored<'a> {
    candidate: &'a Candidate,
    confidence: f64,
    conflict: Option<Conflict>,
}

impl ComplianceMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// One outcome per requirement, in registry order.
    pub fn match_requirements(
        &self,
        registry: &RequirementRegistry,
        proposal: &[TextSegment],
    ) -> Vec<RequirementOutcome> {
        let pool = candidates(proposal);
        registry
            .requirements()
            .iter()
            .map(|requirement| self.match_one(requirement, &pool))
            .collect()
    }

    fn match_one(&self, requirement: &Requirement, pool: &[Candidate]) -> RequirementOutcome {
        let terms = KeyTerms::of(&requirement.text);
        let constraints = RequirementConstraints::of(&requirement.text);

        let mut scored: Vec<Scored<'_>> = if terms.is_empty() {
            Vec::new()
        } else {
            pool.iter()
                .map(|candidate| (candidate, terms.coverage(candidate)))
                .filter(|(_, confidence)| *confidence >= self.config.evidence_floor)
                .map(|(candidate, confidence)| Scored {
                    candidate,
                    confidence,
                    conflict: constraints.conflict(candidate),
                })
                .collect()
        };
        // Stable sort keeps document order among equal confidences.
        scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let (status, observation) = self.verdict(&scored);
        debug!(
            requirement = %requirement.id.0,
            status = status.label(),
            candidates = scored.len(),
            "requirement matched"
        );

        let evidence = scored
            .iter()
            .take(self.config.max_evidence)
            .map(|entry| Evidence {
                requirement_id: requirement.id.clone(),
                source_span: entry.candidate.span,
                extracted_text: entry.candidate.text.clone(),
                confidence: entry.confidence,
            })
            .collect();

        RequirementOutcome {
            requirement: requirement.clone(),
            status,
            observation,
            evidence,
        }
    }

    /// Cumplido needs an affirming strong evidence and no contradicting strong
    /// one; contradictions win ties.
    fn verdict(&self, scored: &[Scored<'_>]) -> (RequirementStatus, String) {
        let Some(best) = scored.first() else {
            return (
                RequirementStatus::Faltante,
                "No se encontró evidencia en la oferta".to_string(),
            );
        };

        let strong = |entry: &&Scored<'_>| entry.confidence >= self.config.cumplido_confidence;
        let affirming = scored
            .iter()
            .filter(strong)
            .find(|entry| entry.conflict.is_none());
        let contradicting = scored
            .iter()
            .filter(strong)
            .find_map(|entry| entry.conflict.as_ref());

        match (affirming, contradicting) {
            (Some(entry), None) => (
                RequirementStatus::Cumplido,
                format!(
                    "Evidencia encontrada (confianza {:.2}): {}",
                    entry.confidence,
                    snippet(&entry.candidate.text)
                ),
            ),
            (Some(_), Some(conflict)) => (
                RequirementStatus::Inconsistente,
                format!("Evidencia contradictoria. {}", conflict.observation()),
            ),
            (None, Some(conflict)) => (RequirementStatus::Inconsistente, conflict.observation()),
            (None, None) => (
                RequirementStatus::Inconsistente,
                format!(
                    "Evidencia parcial (confianza {:.2}): {}",
                    best.confidence,
                    snippet(&best.candidate.text)
                ),
            ),
        }
    }
}

impl Default for ComplianceMatcher {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}

/// Statuses of a match run, in registry order.
pub fn statuses(outcomes: &[RequirementOutcome]) -> Vec<RequirementStatus> {
    outcomes.iter().map(|outcome| outcome.status).collect()
}

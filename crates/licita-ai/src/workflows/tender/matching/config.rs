use serde::{Deserialize, Serialize};

/// Confidence thresholds for the three-state verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum confidence for an affirming evidence to count as `Cumplido`.
    pub cumplido_confidence: f64,
    /// Below this no fragment is kept as evidence.
    pub evidence_floor: f64,
    pub max_evidence: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            cumplido_confidence: 0.7,
            evidence_floor: 0.3,
            max_evidence: 3,
        }
    }
}

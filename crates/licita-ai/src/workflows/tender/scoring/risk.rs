use crate::workflows::tender::domain::{RequirementStatus, RiskLevel};

/// Lowest score still rated `Low` is one above this.
const LOW_RISK_ABOVE: u8 = 85;
const MEDIUM_RISK_FROM: u8 = 60;

/// `round(100 * (C + 0.3 * I) / n)` with halves rounded up, clamped to
/// `0..=100`. Empty input scores 0.
///
/// Integer arithmetic in tenths keeps exact halves exact.
pub fn compliance_score(statuses: &[RequirementStatus]) -> u8 {
    if statuses.is_empty() {
        return 0;
    }
    let earned: u64 = statuses.iter().map(RequirementStatus::weight_tenths).sum();
    let possible = 10 * statuses.len() as u64;
    let score = (200 * earned + possible) / (2 * possible);
    score.min(100) as u8
}

/// An incoherent activity is high risk whatever the score.
pub fn risk_level(compliance_score: u8, activity_coherent: bool) -> RiskLevel {
    if !activity_coherent {
        return RiskLevel::High;
    }
    if compliance_score > LOW_RISK_ABOVE {
        RiskLevel::Low
    } else if compliance_score >= MEDIUM_RISK_FROM {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

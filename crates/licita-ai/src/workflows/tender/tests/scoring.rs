use super::common::*;
use crate::workflows::tender::domain::{
    BidderId, BidderProfile, RequirementOutcome, RequirementStatus, RiskLevel, WarningKind,
};
use crate::workflows::tender::profile::ProfileResolution;
use crate::workflows::tender::registry::RequirementRegistry;
use crate::workflows::tender::scoring::{score, ScoringError};

use RequirementStatus::{Cumplido, Faltante, Inconsistente};

fn outcomes(registry: &RequirementRegistry, statuses: &[RequirementStatus]) -> Vec<RequirementOutcome> {
    registry
        .requirements()
        .iter()
        .zip(statuses)
        .map(|(requirement, status)| RequirementOutcome {
            requirement: requirement.clone(),
            status: *status,
            observation: String::new(),
            evidence: Vec::new(),
        })
        .collect()
}

fn resolution(activity: Option<&str>) -> ProfileResolution {
    let mut profile = BidderProfile::empty();
    profile.declared_activity = activity.map(str::to_string);
    profile.contract_purpose = Some("Construcción del centro de salud".to_string());
    ProfileResolution {
        profile,
        lookup_failure: None,
    }
}

#[test]
fn only_mandatory_requirements_count() {
    let registry = tender_registry();
    let result = score(
        BidderId("oferente-a".to_string()),
        outcomes(
            &registry,
            &[Cumplido, Cumplido, Cumplido, Cumplido, Cumplido, Faltante, Faltante],
        ),
        resolution(Some("F4100.10")),
        &registry,
    )
    .expect("scores");

    assert_eq!(result.compliance_score(), 100);
    assert!(result.activity_coherent());
    assert_eq!(result.risk_level(), RiskLevel::Low);
    assert_eq!(result.requirement_statuses().len(), registry.len());
}

#[test]
fn weighted_partial_compliance() {
    let registry = tender_registry();
    let result = score(
        BidderId("oferente-b".to_string()),
        outcomes(
            &registry,
            &[Cumplido, Faltante, Inconsistente, Inconsistente, Faltante, Cumplido, Cumplido],
        ),
        resolution(Some("F4290.01")),
        &registry,
    )
    .expect("scores");

    assert_eq!(result.compliance_score(), 32);
    assert_eq!(result.risk_level(), RiskLevel::High);
}

#[test]
fn incoherent_activity_is_high_risk_regardless_of_score() {
    let registry = tender_registry();
    let result = score(
        BidderId("oferente-c".to_string()),
        outcomes(&registry, &[Cumplido; 7]),
        resolution(Some("G4690.00")),
        &registry,
    )
    .expect("scores");

    assert_eq!(result.compliance_score(), 100);
    assert!(!result.activity_coherent());
    assert_eq!(result.risk_level(), RiskLevel::High);
}

#[test]
fn missing_activity_is_incoherent_with_warning() {
    let registry = tender_registry();
    let result = score(
        BidderId("oferente-d".to_string()),
        outcomes(&registry, &[Cumplido; 7]),
        resolution(None),
        &registry,
    )
    .expect("scores");

    assert!(!result.activity_coherent());
    let kinds: Vec<WarningKind> = result.warnings().iter().map(|warning| warning.kind).collect();
    assert_eq!(
        kinds,
        [WarningKind::AmbiguousClassification, WarningKind::UnresolvedCoherence]
    );
}

#[test]
fn status_count_must_match_registry() {
    let registry = tender_registry();
    let err = score(
        BidderId("oferente-e".to_string()),
        outcomes(&registry, &[Cumplido, Cumplido]),
        resolution(Some("F4100.10")),
        &registry,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ScoringError::StatusCountMismatch {
            expected: 7,
            actual: 2
        }
    );
}

#[test]
fn upgrading_a_missing_requirement_never_lowers_the_score() {
    let registry = tender_registry();
    let base = [Faltante, Faltante, Inconsistente, Faltante, Cumplido, Faltante, Faltante];
    let score_of = |statuses: &[RequirementStatus]| {
        score(
            BidderId("oferente-f".to_string()),
            outcomes(&registry, statuses),
            resolution(Some("F4100.10")),
            &registry,
        )
        .expect("scores")
        .compliance_score()
    };

    let original = score_of(&base);
    for position in 0..base.len() {
        if base[position] != Faltante {
            continue;
        }
        for upgrade in [Inconsistente, Cumplido] {
            let mut upgraded = base;
            upgraded[position] = upgrade;
            assert!(score_of(&upgraded) >= original);
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::workflows::tender::domain::RegistryStanding;
use crate::workflows::tender::profile::{LookupFailure, ProfileResolver, StaticRegistryLookup};

const PURPOSE: &str = "Construcción del centro de salud tipo B";

#[tokio::test]
async fn resolves_profile_from_proposal_and_registry() {
    let resolver = ProfileResolver::new(Arc::new(registry_records()), Duration::from_secs(1));
    let resolution = resolver
        .resolve(&segments_of(PROPOSAL_ANDINA), Some(PURPOSE))
        .await;

    assert!(resolution.lookup_failure.is_none());
    let profile = resolution.profile;
    assert_eq!(profile.legal_name.as_deref(), Some("Constructora Andina S.A."));
    assert_eq!(profile.tax_id.as_deref(), Some(ANDINA_RUC));
    assert_eq!(profile.declared_activity.as_deref(), Some("F4100.10"));
    assert_eq!(profile.contract_purpose.as_deref(), Some(PURPOSE));
    assert_eq!(profile.tax_status, RegistryStanding::Active);
    assert_eq!(profile.legal_status, RegistryStanding::Active);
    assert_eq!(profile.subscribed_capital, Some(500_000.0));
    assert_eq!(profile.offer.offered_amount, Some(1_250_000.0));
    assert_eq!(profile.offer.execution_term.as_deref(), Some("150 días calendario"));
    assert_eq!(profile.offer.offer_validity.as_deref(), Some("90 días"));
}

#[tokio::test]
async fn registry_standing_is_reported_verbatim() {
    let resolver = ProfileResolver::new(Arc::new(registry_records()), Duration::from_secs(1));
    let resolution = resolver
        .resolve(&segments_of(PROPOSAL_PACIFICO), Some(PURPOSE))
        .await;
    assert_eq!(
        resolution.profile.legal_status,
        RegistryStanding::Reported("DISOLUCION".to_string())
    );
    assert!(resolution.profile.tax_status.is_active());
}

#[tokio::test]
async fn unknown_tax_id_degrades_to_unknown_standing() {
    let resolver =
        ProfileResolver::new(Arc::new(StaticRegistryLookup::default()), Duration::from_secs(1));
    let resolution = resolver
        .resolve(&segments_of(PROPOSAL_ANDINA), Some(PURPOSE))
        .await;

    assert!(matches!(
        resolution.lookup_failure,
        Some(LookupFailure::NotFound { .. })
    ));
    assert_eq!(resolution.profile.tax_status, RegistryStanding::Unknown);
    assert_eq!(resolution.profile.legal_status, RegistryStanding::Unknown);
    assert_eq!(
        resolution.profile.legal_name.as_deref(),
        Some("Constructora Andina S.A.")
    );
}

#[tokio::test]
async fn slow_registry_times_out() {
    let resolver = ProfileResolver::new(
        Arc::new(SlowLookup {
            delay: Duration::from_millis(500),
        }),
        Duration::from_millis(20),
    );
    let resolution = resolver
        .resolve(&segments_of(PROPOSAL_ANDINA), Some(PURPOSE))
        .await;
    assert_eq!(
        resolution.lookup_failure,
        Some(LookupFailure::Timeout { after_ms: 20 })
    );
    assert_eq!(resolution.profile.tax_status, RegistryStanding::Unknown);
}

#[tokio::test]
async fn proposal_without_tax_id_skips_lookup() {
    let resolver = ProfileResolver::new(Arc::new(registry_records()), Duration::from_secs(1));
    let resolution = resolver
        .resolve(
            &segments_of("Razón social: Consorcio Sin Registro\n\nPresentamos la oferta técnica."),
            None,
        )
        .await;
    assert_eq!(resolution.lookup_failure, Some(LookupFailure::MissingTaxId));
    assert!(resolution.profile.contract_purpose.is_none());
}

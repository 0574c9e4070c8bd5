//! Bidder profile resolution: proposal fields cross-checked against registries.

mod lookup;
pub(crate) mod patterns;

pub use lookup::{
    HttpRegistryLookup, LookupFailure, RegistryLookup, RegistryRecord, StaticRegistryLookup,
};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{BidderProfile, OfferTerms, RegistryStanding};
use super::extraction::TextSegment;

/// Resolved profile plus the raw lookup failure, if the cross-check failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileResolution {
    pub profile: BidderProfile,
    pub lookup_failure: Option<LookupFailure>,
}

/// Extracts bidder attributes and awaits one registry lookup under a timeout.
#[derive(Clone)]
pub struct ProfileResolver {
    lookup: Arc<dyn RegistryLookup>,
    timeout: Duration,
}

impl ProfileResolver {
    pub fn new(lookup: Arc<dyn RegistryLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// `tender_purpose` takes precedence over the purpose the proposal restates.
    pub async fn resolve(
        &self,
        segments: &[TextSegment],
        tender_purpose: Option<&str>,
    ) -> ProfileResolution {
        let fields = patterns::scan(segments);
        let mut profile = BidderProfile {
            legal_name: fields.legal_name,
            tax_id: fields.tax_id,
            declared_activity: fields.activity,
            contract_purpose: tender_purpose.map(str::to_string).or(fields.purpose),
            subscribed_capital: fields.capital,
            legal_status: RegistryStanding::Unknown,
            tax_status: RegistryStanding::Unknown,
            offer: OfferTerms {
                offered_amount: fields.offered_amount,
                execution_term: fields.execution_term,
                offer_validity: fields.offer_validity,
            },
        };

        let outcome = match profile.tax_id.clone() {
            Some(tax_id) => self.cross_check(&tax_id).await,
            None => Err(LookupFailure::MissingTaxId),
        };

        let lookup_failure = match outcome {
            Ok(record) => {
                debug!(tax_id = %record.tax_id, "registry record resolved");
                profile.tax_status = record.tax_status;
                profile.legal_status = record.legal_status;
                if profile.legal_name.is_none() {
                    profile.legal_name = record.legal_name;
                }
                if profile.declared_activity.is_none() {
                    profile.declared_activity = record.principal_activity;
                }
                if profile.subscribed_capital.is_none() {
                    profile.subscribed_capital = record.subscribed_capital;
                }
                None
            }
            Err(failure) => {
                warn!(
                    tax_id = profile.tax_id.as_deref().unwrap_or("-"),
                    error = %failure,
                    "registry lookup failed; standing left unknown"
                );
                Some(failure)
            }
        };

        ProfileResolution {
            profile,
            lookup_failure,
        }
    }

    async fn cross_check(&self, tax_id: &str) -> Result<RegistryRecord, LookupFailure> {
        match tokio::time::timeout(self.timeout, self.lookup.lookup(tax_id)).await {
            Ok(result) => result,
            Err(_) => Err(LookupFailure::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

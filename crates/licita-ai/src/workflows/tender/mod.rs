//! Bid compliance evaluation for public tenders.
//!
//! A tender (`pliego`) is turned into an ordered requirement registry; each
//! bidder proposal (`contrato`) is matched against it, cross-checked with the
//! tax and company registries, and scored into a compliance percentage, a
//! risk level and an activity coherence flag.

pub mod domain;
pub mod extraction;
pub(crate) mod lexicon;
pub mod matching;
pub mod pipeline;
pub mod profile;
pub mod projection;
pub mod registry;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BidderId, BidderProfile, BoundingBox, Evidence, EvaluationWarning, OfferTerms,
    RegistryStanding, Requirement, RequirementCategory, RequirementId, RequirementOutcome,
    RequirementStatus, RiskLevel, SourceSpan, WarningKind,
};
pub use extraction::{extract, DocumentFormat, ExtractedDocument, TextSegment, UnreadableDocumentError};
pub use matching::{ComplianceMatcher, MatchingConfig};
pub use pipeline::{EvaluationConfig, EvaluationError, TenderEvaluator};
pub use profile::{
    HttpRegistryLookup, LookupFailure, ProfileResolution, ProfileResolver, RegistryLookup,
    RegistryRecord, StaticRegistryLookup,
};
pub use projection::{BidderView, RegistryView, RequirementView};
pub use registry::{build_registry, RegistryError, RequirementRegistry};
pub use repository::{
    EvaluationRecord, EvaluationRepository, EvaluationStatus, EvaluationStatusView,
    RepositoryError,
};
pub use router::evaluation_router;
pub use scoring::{score, EvaluationResult, ScoringError};
pub use service::{BidEvaluationService, BidSubmission, ServiceError};

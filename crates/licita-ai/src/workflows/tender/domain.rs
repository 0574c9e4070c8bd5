use serde::{Deserialize, Serialize};

/// Identifier assigned to a bidder evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BidderId(pub String);

impl BidderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BidderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional requirement identity (`REQ-001`, `REQ-002`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequirementId(pub String);

impl RequirementId {
    pub fn from_position(position: usize) -> Self {
        Self(format!("REQ-{:03}", position + 1))
    }
}

/// Thematic bucket of a tender clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementCategory {
    CondicionesLegales,
    RequisitosTecnicos,
    CondicionesEconomicas,
    GarantiasYPolizas,
    PlazosYEntregables,
    Otro,
}

impl RequirementCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RequirementCategory::CondicionesLegales => "Condiciones legales",
            RequirementCategory::RequisitosTecnicos => "Requisitos técnicos",
            RequirementCategory::CondicionesEconomicas => "Condiciones económicas",
            RequirementCategory::GarantiasYPolizas => "Garantías y pólizas",
            RequirementCategory::PlazosYEntregables => "Plazos y entregables",
            RequirementCategory::Otro => "Otro",
        }
    }
}

/// Clause extracted from the tender. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub text: String,
    pub category: RequirementCategory,
    pub mandatory: bool,
}

/// Page coordinates reported by the layout source, `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x0, y0, x1, y1]: [f32; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub page: u32,
    pub segment_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

/// Proposal fragment matched against a requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub requirement_id: RequirementId,
    pub source_span: SourceSpan,
    pub extracted_text: String,
    /// Share of the requirement's key terms found in the fragment, in `[0, 1]`.
    pub confidence: f64,
}

/// Per-requirement verdict. Serialized with the dashboard's lowercase literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStatus {
    Cumplido,
    Faltante,
    Inconsistente,
}

impl RequirementStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RequirementStatus::Cumplido => "cumplido",
            RequirementStatus::Faltante => "faltante",
            RequirementStatus::Inconsistente => "inconsistente",
        }
    }

    /// Contribution of this status to the compliance numerator, in tenths.
    pub(crate) fn weight_tenths(&self) -> u64 {
        match self {
            RequirementStatus::Cumplido => 10,
            RequirementStatus::Inconsistente => 3,
            RequirementStatus::Faltante => 0,
        }
    }
}

/// Standing reported by a registry (SRI or Superintendencia de Compañías).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegistryStanding {
    Active,
    Reported(String),
    Unknown,
}

impl RegistryStanding {
    /// Normalise a raw registry label; blank values mean the registry said nothing.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Unknown;
        }
        match trimmed.to_uppercase().as_str() {
            "ACTIVO" | "ACTIVA" | "ACTIVE" => Self::Active,
            _ => Self::Reported(trimmed.to_uppercase()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            RegistryStanding::Active => "ACTIVO".to_string(),
            RegistryStanding::Reported(value) => value.clone(),
            RegistryStanding::Unknown => "Unknown".to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RegistryStanding::Active)
    }
}

/// Commercial terms stated in the proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferTerms {
    pub offered_amount: Option<f64>,
    pub execution_term: Option<String>,
    pub offer_validity: Option<String>,
}

/// Bidder attributes resolved from the proposal and the external registries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderProfile {
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    /// CIIU activity code, e.g. `F4100.10`.
    pub declared_activity: Option<String>,
    pub contract_purpose: Option<String>,
    pub subscribed_capital: Option<f64>,
    pub legal_status: RegistryStanding,
    pub tax_status: RegistryStanding,
    pub offer: OfferTerms,
}

impl BidderProfile {
    pub fn empty() -> Self {
        Self {
            legal_name: None,
            tax_id: None,
            declared_activity: None,
            contract_purpose: None,
            subscribed_capital: None,
            legal_status: RegistryStanding::Unknown,
            tax_status: RegistryStanding::Unknown,
            offer: OfferTerms::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "medio")]
    Medium,
    #[serde(rename = "alto")]
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "bajo",
            RiskLevel::Medium => "medio",
            RiskLevel::High => "alto",
        }
    }
}

/// Non-fatal notice recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationWarning {
    pub kind: WarningKind,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Clause carried both or neither obligation and informational markers.
    AmbiguousClassification,
    /// Activity code or contract purpose could not be mapped.
    UnresolvedCoherence,
}

impl EvaluationWarning {
    pub fn ambiguous(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::AmbiguousClassification,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn coherence(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnresolvedCoherence,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Matcher verdict for one requirement, with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementOutcome {
    pub requirement: Requirement,
    pub status: RequirementStatus,
    pub observation: String,
    pub evidence: Vec<Evidence>,
}

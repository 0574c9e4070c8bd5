//! Dashboard projection of evaluation results.

use serde::Serialize;

use super::domain::{RegistryStanding, RequirementStatus, RiskLevel};
use super::profile::RegistryRecord;
use super::scoring::EvaluationResult;

/// Output record consumed by the dashboard. Field names are fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderView {
    pub id: String,
    pub nombre: String,
    pub presupuesto_ofertado: f64,
    pub plazo_ofertado: String,
    pub score_cumplimiento: u8,
    pub nivel_riesgo: RiskLevel,
    pub estado_legal: String,
    pub capital_suscrito: f64,
    pub coherencia_actividad: bool,
    pub ruc: String,
    #[serde(rename = "estadoSRI")]
    pub estado_sri: String,
    pub estado_supercias: String,
    pub objeto_contrato: String,
    pub actividad_principal: String,
    pub monto_ofertado: f64,
    pub plazo_ejecucion: String,
    pub validez_oferta: String,
    pub requisitos: Vec<RequirementView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementView {
    pub requisito: String,
    pub estado: RequirementStatus,
    pub observacion: String,
}

/// Combined standing: any non-active report wins, then any active one.
fn legal_standing(tax: &RegistryStanding, legal: &RegistryStanding) -> String {
    match (tax, legal) {
        (RegistryStanding::Reported(value), _) | (_, RegistryStanding::Reported(value)) => {
            value.clone()
        }
        (RegistryStanding::Active, _) | (_, RegistryStanding::Active) => {
            RegistryStanding::Active.label()
        }
        (RegistryStanding::Unknown, RegistryStanding::Unknown) => RegistryStanding::Unknown.label(),
    }
}

impl From<&EvaluationResult> for BidderView {
    fn from(result: &EvaluationResult) -> Self {
        let profile = result.profile();
        let offer = &profile.offer;
        let amount = offer.offered_amount.unwrap_or_default();
        let term = offer.execution_term.clone().unwrap_or_default();

        Self {
            id: result.bidder_id().to_string(),
            nombre: profile
                .legal_name
                .clone()
                .unwrap_or_else(|| result.bidder_id().to_string()),
            presupuesto_ofertado: amount,
            plazo_ofertado: term.clone(),
            score_cumplimiento: result.compliance_score(),
            nivel_riesgo: result.risk_level(),
            estado_legal: legal_standing(&profile.tax_status, &profile.legal_status),
            capital_suscrito: profile.subscribed_capital.unwrap_or_default(),
            coherencia_actividad: result.activity_coherent(),
            ruc: profile.tax_id.clone().unwrap_or_default(),
            estado_sri: profile.tax_status.label(),
            estado_supercias: profile.legal_status.label(),
            objeto_contrato: profile.contract_purpose.clone().unwrap_or_default(),
            actividad_principal: profile.declared_activity.clone().unwrap_or_default(),
            monto_ofertado: amount,
            plazo_ejecucion: term,
            validez_oferta: offer.offer_validity.clone().unwrap_or_default(),
            requisitos: result
                .outcomes()
                .iter()
                .map(|outcome| RequirementView {
                    requisito: outcome.requirement.text.clone(),
                    estado: outcome.status,
                    observacion: outcome.observation.clone(),
                })
                .collect(),
        }
    }
}

/// Registry passthrough for `/api/v1/empresa/:ruc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryView {
    pub ruc: String,
    pub razon_social: String,
    #[serde(rename = "estadoSRI")]
    pub estado_sri: String,
    pub estado_supercias: String,
    pub actividad_principal: String,
    pub capital_suscrito: f64,
}

impl From<RegistryRecord> for RegistryView {
    fn from(record: RegistryRecord) -> Self {
        Self {
            ruc: record.tax_id,
            razon_social: record.legal_name.unwrap_or_default(),
            estado_sri: record.tax_status.label(),
            estado_supercias: record.legal_status.label(),
            actividad_principal: record.principal_activity.unwrap_or_default(),
            capital_suscrito: record.subscribed_capital.unwrap_or_default(),
        }
    }
}

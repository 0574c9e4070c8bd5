use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::workflows::tender::domain::BidderId;
use crate::workflows::tender::extraction::{extract, TextSegment};
use crate::workflows::tender::pipeline::{EvaluationConfig, TenderEvaluator};
use crate::workflows::tender::profile::{
    LookupFailure, RegistryLookup, RegistryRecord, StaticRegistryLookup,
};
use crate::workflows::tender::registry::{build_registry, RequirementRegistry};
use crate::workflows::tender::repository::{
    EvaluationRecord, EvaluationRepository, EvaluationStatus, RepositoryError,
};
use crate::workflows::tender::service::BidEvaluationService;

pub(super) const TENDER: &str = "SERCOP - Servicio Nacional de Contratación Pública
PLIEGO DEL PROCEDIMIENTO DE LICITACIÓN DE OBRAS

OBJETO DEL CONTRATO
Construcción del centro de salud tipo B en el cantón Pedro Moncayo.

REQUISITOS MÍNIMOS
1. El oferente deberá presentar el Registro Único de Contribuyentes (RUC) activo.
2. El oferente deberá presentar el certificado de cumplimiento de obligaciones con la Superintendencia de Compañías.
3. Se exige garantía de fiel cumplimiento mediante garantía bancaria incondicional.
4. Experiencia mínima de 5 proyectos similares en construcción de edificaciones.
5. El plazo máximo de ejecución de la obra será de 180 días.

Página 1 de 2
\u{c}CONDICIONES GENERALES
La visita técnica al sitio de la obra no es obligatoria.
El oferente podrá adjuntar catálogos de materiales de manera referencial.
";

pub(super) const PROPOSAL_ANDINA: &str = "OFERTA TÉCNICA Y ECONÓMICA

Razón social: Constructora Andina S.A., RUC: 1792345678001

Actividad económica principal: F4100.10 construcción de edificios

Presentamos el Registro Único de Contribuyentes (RUC) activo de la compañía.

Adjuntamos el certificado de cumplimiento de obligaciones emitido por la Superintendencia de Compañías.

Se adjunta garantía bancaria incondicional de fiel cumplimiento.

Acreditamos experiencia en 7 proyectos similares de construcción de edificaciones.

Plazo de ejecución de la obra: 150 días calendario.

El monto ofertado es de USD 1.250.000,00 sin IVA.

Validez de la oferta: 90 días.
";

pub(super) const PROPOSAL_PACIFICO: &str = "OFERTA

Razón social: Obras Civiles del Pacífico Ltda., RUC: 0992123456001

Actividad económica principal: F4290.01 obras de ingeniería civil

Presentamos el Registro Único de Contribuyentes (RUC) activo de la compañía.

Se adjunta póliza de seguro de fiel cumplimiento incondicional.

Acreditamos experiencia en 3 proyectos similares de construcción de edificaciones.
";

pub(super) const PROPOSAL_GLOBAL: &str = "OFERTA

Razón social: Comercializadora Global S.A., RUC: 1790011223001

Actividad económica principal: G4690.00 venta al por mayor no especializada

Presentamos el Registro Único de Contribuyentes (RUC) activo de la compañía.

Adjuntamos el certificado de cumplimiento de obligaciones emitido por la Superintendencia de Compañías.

Se adjunta garantía bancaria incondicional de fiel cumplimiento.

Acreditamos experiencia en 6 proyectos similares de construcción de edificaciones.

Plazo de ejecución de la obra: 170 días calendario.
";

pub(super) const ANDINA_RUC: &str = "1792345678001";
pub(super) const PACIFICO_RUC: &str = "0992123456001";

pub(super) fn segments_of(text: &str) -> Vec<TextSegment> {
    extract(text.as_bytes())
        .expect("fixture is readable")
        .segments()
        .collect()
}

pub(super) fn tender_registry() -> RequirementRegistry {
    build_registry(segments_of(TENDER)).expect("fixture has requirements")
}

pub(super) fn registry_records() -> StaticRegistryLookup {
    let mut andina = RegistryRecord::new(ANDINA_RUC, "ACTIVO", "ACTIVA");
    andina.legal_name = Some("CONSTRUCTORA ANDINA S.A.".to_string());
    andina.subscribed_capital = Some(500_000.0);
    let pacifico = RegistryRecord::new(PACIFICO_RUC, "ACTIVO", "DISOLUCION");
    StaticRegistryLookup::new([andina, pacifico])
}

pub(super) fn evaluation_config() -> EvaluationConfig {
    EvaluationConfig {
        lookup_timeout: Duration::from_millis(200),
        ..EvaluationConfig::default()
    }
}

pub(super) fn evaluator() -> TenderEvaluator {
    TenderEvaluator::new(Arc::new(registry_records()), evaluation_config())
}

/// Delegates to the fixture registry after a delay.
pub(super) struct SlowLookup {
    pub(super) delay: Duration,
}

#[async_trait]
impl RegistryLookup for SlowLookup {
    async fn lookup(&self, tax_id: &str) -> Result<RegistryRecord, LookupFailure> {
        tokio::time::sleep(self.delay).await;
        registry_records().lookup(tax_id).await
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<BidderId, EvaluationRecord>>>,
}

impl EvaluationRepository for MemoryRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.bidder_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.bidder_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.bidder_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &BidderId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn evaluated(&self) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<EvaluationRecord> = guard
            .values()
            .filter(|record| record.status == EvaluationStatus::Evaluated)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.submitted_at);
        Ok(records)
    }
}

pub(super) fn build_service() -> (BidEvaluationService<MemoryRepository>, Arc<MemoryRepository>) {
    build_service_with(Arc::new(registry_records()))
}

pub(super) fn build_service_with(
    lookup: Arc<dyn RegistryLookup>,
) -> (BidEvaluationService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = BidEvaluationService::new(repository.clone(), lookup, evaluation_config());
    (service, repository)
}

/// Poll until the run leaves `Pending`.
pub(super) async fn wait_until_settled(
    service: &BidEvaluationService<MemoryRepository>,
    id: &BidderId,
) -> EvaluationRecord {
    for _ in 0..200 {
        let record = service.get(id).expect("record exists");
        if record.status != EvaluationStatus::Pending {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("evaluation {id} did not settle");
}

pub(super) const BOUNDARY: &str = "licita-boundary";

/// `multipart/form-data` request with text parts `(name, content type, body)`.
pub(super) fn multipart_request(uri: &str, parts: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, content_type, content) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.txt\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

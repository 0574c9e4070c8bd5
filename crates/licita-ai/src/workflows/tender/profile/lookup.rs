//! External registry lookups (SRI tax standing, Supercias legal standing).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};

use super::patterns::parse_amount;
use crate::workflows::tender::domain::RegistryStanding;

/// Consolidated registry entry for one tax id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub tax_id: String,
    pub tax_status: RegistryStanding,
    pub legal_status: RegistryStanding,
    pub legal_name: Option<String>,
    pub principal_activity: Option<String>,
    pub subscribed_capital: Option<f64>,
}

impl RegistryRecord {
    pub fn new(tax_id: impl Into<String>, tax_status: &str, legal_status: &str) -> Self {
        Self {
            tax_id: tax_id.into(),
            tax_status: RegistryStanding::from_raw(tax_status),
            legal_status: RegistryStanding::from_raw(legal_status),
            legal_name: None,
            principal_activity: None,
            subscribed_capital: None,
        }
    }
}

/// Why a registry cross-check produced nothing. Never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupFailure {
    #[error("tax id {tax_id} not found in registry")]
    NotFound { tax_id: String },
    #[error("registry lookup timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("registry transport error: {message}")]
    Transport { message: String },
    #[error("registry returned an invalid response: {message}")]
    InvalidResponse { message: String },
    #[error("proposal does not state a tax id")]
    MissingTaxId,
}

/// Injected capability answering `lookup(taxId)`.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn lookup(&self, tax_id: &str) -> Result<RegistryRecord, LookupFailure>;
}

/// In-memory registry, optionally loaded from a CSV table.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistryLookup {
    records: HashMap<String, RegistryRecord>,
}

impl StaticRegistryLookup {
    pub fn new(records: impl IntoIterator<Item = RegistryRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.tax_id.clone(), record))
                .collect(),
        }
    }

    pub fn insert(&mut self, record: RegistryRecord) {
        self.records.insert(record.tax_id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Columns: `ruc, estado_sri, estado_supercias, razon_social,
    /// actividad_principal, capital_suscrito`. Only `ruc` is required.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut lookup = Self::default();

        for row in csv_reader.deserialize::<RegistryRow>() {
            let row = row?;
            let mut record = RegistryRecord::new(
                row.ruc,
                row.estado_sri.as_deref().unwrap_or_default(),
                row.estado_supercias.as_deref().unwrap_or_default(),
            );
            record.legal_name = row.razon_social;
            record.principal_activity = row.actividad_principal;
            record.subscribed_capital = row.capital_suscrito.as_deref().and_then(parse_amount);
            lookup.insert(record);
        }

        Ok(lookup)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, csv::Error> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }
}

#[async_trait]
impl RegistryLookup for StaticRegistryLookup {
    async fn lookup(&self, tax_id: &str) -> Result<RegistryRecord, LookupFailure> {
        self.records
            .get(tax_id)
            .cloned()
            .ok_or_else(|| LookupFailure::NotFound {
                tax_id: tax_id.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct RegistryRow {
    ruc: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    estado_sri: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    estado_supercias: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    razon_social: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    actividad_principal: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    capital_suscrito: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Client for a consolidated registry service exposing
/// `GET {base}/api/v1/empresa/{ruc}`.
#[derive(Clone)]
pub struct HttpRegistryLookup {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRegistryLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

/// Merged SRI and Supercias payload. The two sources name fields differently,
/// so keys are probed in order and the first non-blank value wins.
struct EmpresaPayload(serde_json::Map<String, serde_json::Value>);

impl EmpresaPayload {
    fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key) {
            Some(serde_json::Value::String(value)) if !value.trim().is_empty() => {
                Some(value.trim().to_string())
            }
            _ => None,
        })
    }

    fn amount(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|key| match self.0.get(*key) {
            Some(serde_json::Value::Number(number)) => number.as_f64(),
            Some(serde_json::Value::String(raw)) => parse_amount(raw),
            _ => None,
        })
    }

    fn into_record(self, tax_id: &str) -> Result<RegistryRecord, LookupFailure> {
        let tax_status = self.text(&["estadoContribuyenteRuc", "estadoSRI", "estado_sri"]);
        let legal_status = self.text(&["situacionLegal", "estadoSupercias", "estado_supercias"]);
        let legal_name = self.text(&["razonSocial", "Nombre", "razon_social"]);
        let principal_activity = self.text(&[
            "actividadEconomicaPrincipal",
            "actividadPrincipal",
            "actividad_principal",
        ]);
        let subscribed_capital =
            self.amount(&["CapitalSuscrito", "capitalSuscrito", "capital_suscrito"]);

        if tax_status.is_none()
            && legal_status.is_none()
            && legal_name.is_none()
            && principal_activity.is_none()
            && subscribed_capital.is_none()
        {
            return Err(LookupFailure::NotFound {
                tax_id: tax_id.to_string(),
            });
        }

        let mut record = RegistryRecord::new(
            tax_id,
            tax_status.as_deref().unwrap_or_default(),
            legal_status.as_deref().unwrap_or_default(),
        );
        record.legal_name = legal_name;
        record.principal_activity = principal_activity;
        record.subscribed_capital = subscribed_capital;
        Ok(record)
    }
}

#[async_trait]
impl RegistryLookup for HttpRegistryLookup {
    async fn lookup(&self, tax_id: &str) -> Result<RegistryRecord, LookupFailure> {
        let url = format!("{}/api/v1/empresa/{}", self.base_url, tax_id);
        let response = self.client.get(&url).send().await.map_err(|err| {
            if err.is_timeout() {
                LookupFailure::Timeout {
                    after_ms: self.timeout.as_millis() as u64,
                }
            } else {
                LookupFailure::Transport {
                    message: err.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupFailure::NotFound {
                tax_id: tax_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(LookupFailure::Transport {
                message: format!("HTTP {status}"),
            });
        }

        let payload = response
            .json::<serde_json::Map<String, serde_json::Value>>()
            .await
            .map_err(|err| LookupFailure::InvalidResponse {
                message: err.to_string(),
            })?;
        EmpresaPayload(payload).into_record(tax_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_lookup_reads_csv_rows() {
        let csv = "ruc,estado_sri,estado_supercias,razon_social,actividad_principal,capital_suscrito\n\
1792345678001,ACTIVO,ACTIVA,Constructora Andina S.A.,F4100.10,\"500.000,00\"\n\
0992123456001,SUSPENDIDO,,Obras Civiles del Pacífico Ltda.,,\n";
        let lookup = StaticRegistryLookup::from_csv_reader(csv.as_bytes()).expect("csv parses");
        assert_eq!(lookup.len(), 2);

        let andina = lookup.lookup("1792345678001").await.expect("present");
        assert_eq!(andina.tax_status, RegistryStanding::Active);
        assert_eq!(andina.legal_status, RegistryStanding::Active);
        assert_eq!(andina.subscribed_capital, Some(500_000.0));

        let pacifico = lookup.lookup("0992123456001").await.expect("present");
        assert_eq!(
            pacifico.tax_status,
            RegistryStanding::Reported("SUSPENDIDO".to_string())
        );
        assert_eq!(pacifico.legal_status, RegistryStanding::Unknown);
        assert!(pacifico.principal_activity.is_none());
    }

    #[tokio::test]
    async fn static_lookup_reports_missing_tax_id() {
        let lookup = StaticRegistryLookup::default();
        let err = lookup.lookup("1790000000001").await.expect_err("absent");
        assert_eq!(
            err,
            LookupFailure::NotFound {
                tax_id: "1790000000001".to_string()
            }
        );
    }

    #[test]
    fn empty_payload_means_not_found() {
        let payload = EmpresaPayload(serde_json::from_str(r#"{"razonSocial": ""}"#).unwrap());
        assert!(matches!(
            payload.into_record("1790000000001"),
            Err(LookupFailure::NotFound { .. })
        ));
    }

    #[test]
    fn payload_merges_sri_and_supercias_keys() {
        let payload = EmpresaPayload(
            serde_json::from_str(
                r#"{"estadoContribuyenteRuc": "ACTIVO", "razonSocial": "", "situacionLegal": "ACTIVA", "Nombre": "CONSTRUCTORA ANDINA S.A.", "CapitalSuscrito": "800,00"}"#,
            )
            .unwrap(),
        );
        let record = payload.into_record("1792345678001").unwrap();
        assert!(record.tax_status.is_active());
        assert!(record.legal_status.is_active());
        assert_eq!(record.legal_name.as_deref(), Some("CONSTRUCTORA ANDINA S.A."));
        assert_eq!(record.subscribed_capital, Some(800.0));
    }
}

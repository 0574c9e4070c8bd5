use licita_ai::config::EngineConfig;
use licita_ai::error::AppError;
use licita_ai::workflows::tender::{
    BidderId, EvaluationRecord, EvaluationRepository, EvaluationStatus, HttpRegistryLookup,
    RegistryLookup, RepositoryError, StaticRegistryLookup,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    records: Arc<Mutex<HashMap<BidderId, EvaluationRecord>>>,
}

impl InMemoryEvaluationRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<BidderId, EvaluationRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.bidder_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.bidder_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.bidder_id) {
            guard.insert(record.bidder_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &BidderId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn evaluated(&self) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut records: Vec<EvaluationRecord> = guard
            .values()
            .filter(|record| record.status == EvaluationStatus::Evaluated)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.bidder_id.as_str().cmp(b.bidder_id.as_str()))
        });
        Ok(records)
    }
}

/// HTTP registry when a URL is configured, else a CSV table, else an empty
/// table that answers "not found" for every tax id.
pub(crate) fn build_lookup(engine: &EngineConfig) -> Result<Arc<dyn RegistryLookup>, AppError> {
    if let Some(url) = &engine.registry_url {
        info!(registry_url = %url, "using HTTP registry lookup");
        let lookup = HttpRegistryLookup::new(url.clone(), engine.lookup_timeout)?;
        return Ok(Arc::new(lookup));
    }
    if let Some(path) = &engine.registry_csv {
        let lookup = StaticRegistryLookup::from_csv_path(path)?;
        info!(path = %path.display(), companies = lookup.len(), "loaded registry table");
        return Ok(Arc::new(lookup));
    }
    warn!("no registry configured; legal standing will be reported as Unknown");
    Ok(Arc::new(StaticRegistryLookup::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn repository_rejects_duplicates_and_lists_evaluated() {
        let repository = InMemoryEvaluationRepository::default();
        let first = EvaluationRecord::pending(BidderId("a".to_string()));
        repository.insert(first.clone()).expect("inserted");
        assert!(matches!(
            repository.insert(first.clone()),
            Err(RepositoryError::Conflict)
        ));
        assert!(repository.evaluated().expect("listed").is_empty());

        let mut settled = first;
        settled.status = EvaluationStatus::Evaluated;
        repository.update(settled).expect("updated");
        assert_eq!(repository.evaluated().expect("listed").len(), 1);

        let missing = EvaluationRecord::pending(BidderId("b".to_string()));
        assert!(matches!(
            repository.update(missing),
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn csv_table_is_used_without_url() {
        let path = std::env::temp_dir().join(format!("licita-registry-{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).expect("temp file");
        writeln!(file, "ruc,estado_sri,estado_supercias").expect("header");
        writeln!(file, "1792345678001,ACTIVO,ACTIVA").expect("row");
        drop(file);

        let engine = EngineConfig {
            registry_csv: Some(path.clone()),
            ..EngineConfig::default()
        };
        let lookup = build_lookup(&engine).expect("lookup built");
        let record = lookup.lookup("1792345678001").await.expect("known ruc");
        assert!(record.tax_status.is_active());
        std::fs::remove_file(path).ok();
    }
}

use crate::infra::build_lookup;
use clap::Args;
use licita_ai::config::AppConfig;
use licita_ai::error::AppError;
use licita_ai::workflows::tender::{
    BidderId, BidderView, EvaluationConfig, EvaluationError, EvaluationResult, RegistryRecord,
    RequirementRegistry, StaticRegistryLookup, TenderEvaluator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Tender document (text layer or layout JSON)
    #[arg(long)]
    pub(crate) pliego: PathBuf,
    /// Bidder proposal (text layer or layout JSON)
    #[arg(long)]
    pub(crate) contrato: PathBuf,
    /// Bidder identifier. Defaults to the proposal file name.
    #[arg(long)]
    pub(crate) id: Option<String>,
    /// CSV registry table used instead of the configured registry
    #[arg(long)]
    pub(crate) registry_csv: Option<PathBuf>,
    /// Print the dashboard record as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the dashboard records as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        pliego,
        contrato,
        id,
        registry_csv,
        json,
    } = args;

    let mut engine = AppConfig::load()?.engine;
    if let Some(path) = registry_csv {
        engine.registry_url = None;
        engine.registry_csv = Some(path);
    }

    let tender = read_document(&pliego)?;
    let proposal = read_document(&contrato)?;
    let bidder_id = id.unwrap_or_else(|| {
        contrato
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "oferente".to_string())
    });

    let evaluator = TenderEvaluator::new(
        build_lookup(&engine)?,
        EvaluationConfig::from_engine(&engine),
    );
    let result = evaluator
        .evaluate(BidderId(bidder_id), &tender, &proposal)
        .await?;

    if json {
        print_json(&BidderView::from(&result));
    } else {
        render_result(&result);
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let (registry, results) = evaluate_samples().await?;

    if args.json {
        let views: Vec<BidderView> = results
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok())
            .map(BidderView::from)
            .collect();
        print_json(&views);
        return Ok(());
    }

    println!("Bid evaluation demo");
    println!(
        "Contract purpose: {}",
        registry.contract_purpose().unwrap_or("(not stated)")
    );
    println!(
        "{} requirements ({} mandatory)",
        registry.len(),
        registry.mandatory_count()
    );
    for warning in registry.warnings() {
        println!("  ! {}: {}", warning.subject, warning.message);
    }

    for (bidder_id, result) in &results {
        println!();
        match result {
            Ok(result) => render_result(result),
            Err(err) => println!("{bidder_id}: evaluation failed: {err}"),
        }
    }
    Ok(())
}

/// Evaluate the bundled proposals against the bundled tender.
pub(crate) async fn evaluate_samples() -> Result<
    (
        Arc<RequirementRegistry>,
        Vec<(BidderId, Result<EvaluationResult, EvaluationError>)>,
    ),
    AppError,
> {
    let evaluator = TenderEvaluator::new(Arc::new(sample_registry()), EvaluationConfig::default());
    let registry = Arc::new(evaluator.build_registry(SAMPLE_TENDER.as_bytes())?);
    let proposals = SAMPLE_PROPOSALS
        .iter()
        .map(|(id, text)| (BidderId(id.to_string()), text.as_bytes().to_vec()))
        .collect();
    let results = evaluator.evaluate_all(Arc::clone(&registry), proposals).await;
    Ok((registry, results))
}

fn read_document(path: &Path) -> Result<Vec<u8>, AppError> {
    let guessed = mime_guess::from_path(path).first();
    if guessed.is_some_and(|mime| mime == mime_guess::mime::APPLICATION_PDF) {
        return Err(AppError::Input(format!(
            "{}: PDF files are not accepted; export the text layer or layout JSON first",
            path.display()
        )));
    }
    Ok(std::fs::read(path)?)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("JSON output unavailable: {err}"),
    }
}

fn render_result(result: &EvaluationResult) {
    let view = BidderView::from(result);
    println!("{} ({})", view.nombre, view.id);
    println!(
        "- RUC {} | SRI {} | Supercias {} | legal standing {}",
        if view.ruc.is_empty() { "-" } else { view.ruc.as_str() },
        view.estado_sri,
        view.estado_supercias,
        view.estado_legal
    );
    println!(
        "- Compliance {}% | risk {} | activity {} {}",
        view.score_cumplimiento,
        result.risk_level().label(),
        if view.actividad_principal.is_empty() { "-" } else { view.actividad_principal.as_str() },
        if view.coherencia_actividad {
            "(coherent)"
        } else {
            "(not coherent)"
        }
    );
    if let Some(failure) = result.lookup_failure() {
        println!("- Registry lookup: {failure}");
    }
    for outcome in result.outcomes() {
        println!(
            "  [{}] {} {}: {}",
            outcome.status.label(),
            outcome.requirement.id.0,
            outcome.requirement.category.label(),
            outcome.requirement.text
        );
        println!("      {}", outcome.observation);
    }
    for warning in result.warnings() {
        println!("  ! {}: {}", warning.subject, warning.message);
    }
}

fn sample_registry() -> StaticRegistryLookup {
    let mut andes = RegistryRecord::new("1791112223001", "ACTIVO", "ACTIVA");
    andes.legal_name = Some("SERVICIOS TECNICOS ANDES S.A.".to_string());
    andes.subscribed_capital = Some(120_000.0);
    let quito = RegistryRecord::new("1790223344001", "ACTIVO", "INACTIVA");
    StaticRegistryLookup::new([andes, quito])
}

const SAMPLE_TENDER: &str = "PLIEGO DE SUBASTA INVERSA ELECTRÓNICA

OBJETO DEL CONTRATO
Servicio de mantenimiento preventivo y correctivo de ascensores del Hospital General.

REQUISITOS MÍNIMOS
1. El oferente deberá presentar el RUC activo con actividad de mantenimiento de ascensores.
2. Se exige póliza de responsabilidad civil vigente por todo el plazo del contrato.
3. Experiencia mínima de 3 contratos similares de mantenimiento de ascensores.
4. El oferente deberá contar con 2 técnicos certificados como mínimo.
5. El plazo máximo de atención de emergencias será de 4 horas.
";

const SAMPLE_PROPOSALS: [(&str, &str); 3] = [
    (
        "andes",
        "OFERTA TÉCNICA

Razón social: Servicios Técnicos Andes S.A., RUC: 1791112223001

Actividad económica principal: N8110.01 mantenimiento integral de instalaciones

Presentamos el RUC activo con actividad de mantenimiento de ascensores.

Adjuntamos póliza de responsabilidad civil vigente por todo el plazo del contrato.

Acreditamos experiencia en 5 contratos similares de mantenimiento de ascensores.

Contamos con 4 técnicos certificados en ascensores.

El plazo de atención de emergencias será de 2 horas.

El monto ofertado es de USD 48.000,00 sin IVA.

Plazo de ejecución: 12 meses.

Validez de la oferta: 60 días.
",
    ),
    (
        "quito-elevadores",
        "OFERTA

Razón social: Quito Elevadores Cía. Ltda., RUC: 1790223344001

Actividad económica principal: N8110.02 mantenimiento de edificios

Presentamos el RUC activo con actividad de mantenimiento de ascensores.

Se adjunta garantía bancaria de responsabilidad civil por el plazo del contrato.

Acreditamos experiencia en 2 contratos similares de mantenimiento de ascensores.
",
    ),
    (
        "comercial-sierra",
        "OFERTA

Razón social: Comercial Sierra S.A., RUC: 1790998877001

Actividad económica principal: G4659.11 venta al por mayor de maquinaria

Presentamos el RUC activo con actividad de mantenimiento de ascensores.

Adjuntamos póliza de responsabilidad civil vigente por todo el plazo del contrato.

Acreditamos experiencia en 3 contratos similares de mantenimiento de ascensores.
",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use licita_ai::workflows::tender::RiskLevel;

    #[tokio::test]
    async fn samples_evaluate_against_shared_registry() {
        let (registry, results) = evaluate_samples().await.expect("samples evaluate");
        assert_eq!(registry.len(), 5);
        assert_eq!(results.len(), 3);

        let scored: Vec<&EvaluationResult> = results
            .iter()
            .map(|(_, result)| result.as_ref().expect("sample evaluates"))
            .collect();
        for result in &scored {
            assert_eq!(result.requirement_statuses().len(), registry.len());
        }
        assert!(scored[0].compliance_score() >= scored[1].compliance_score());
        assert!(!scored[2].activity_coherent());
        assert_eq!(scored[2].risk_level(), RiskLevel::High);
        assert_eq!(BidderView::from(scored[2]).estado_sri, "Unknown");
    }

    #[test]
    fn pdf_paths_are_rejected() {
        let err = read_document(Path::new("pliego.pdf")).expect_err("pdf refused");
        assert!(matches!(err, AppError::Input(_)));
    }
}

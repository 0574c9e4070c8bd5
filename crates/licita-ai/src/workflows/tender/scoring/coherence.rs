//! CIIU activity versus contract purpose compatibility.

use std::sync::LazyLock;

use regex::Regex;

use crate::workflows::tender::domain::EvaluationWarning;
use crate::workflows::tender::lexicon::{contains_phrase, tokenize};

/// Broad kind of procurement named by a contract purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurposeCategory {
    Construction,
    Consulting,
    Technology,
    Supply,
    Services,
}

impl PurposeCategory {
    /// Tie-break order when a purpose hits several categories equally.
    const ALL: [PurposeCategory; 5] = [
        PurposeCategory::Construction,
        PurposeCategory::Consulting,
        PurposeCategory::Technology,
        PurposeCategory::Supply,
        PurposeCategory::Services,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            PurposeCategory::Construction => &[
                "construccion*",
                "construir",
                "obra*",
                "edificio*",
                "edificacion*",
                "rehabilitacion*",
                "remodelacion*",
                "ampliacion*",
                "vial*",
                "carretera*",
                "puente*",
                "alcantarillado*",
                "infraestructura*",
                "asfaltado*",
                "pavimentacion*",
            ],
            PurposeCategory::Consulting => &[
                "consultoria*",
                "fiscalizacion*",
                "estudio*",
                "diseno*",
                "asesoria*",
                "auditoria*",
                "supervision*",
            ],
            PurposeCategory::Technology => &[
                "software",
                "sistema informatico",
                "sistemas informaticos",
                "tecnologia*",
                "informatic*",
                "licencia*",
                "plataforma*",
                "computo",
                "computador*",
                "telecomunicacion*",
            ],
            PurposeCategory::Supply => &[
                "adquisicion*",
                "suministro*",
                "compra*",
                "provision*",
                "bienes",
                "equipamiento*",
                "dotacion*",
                "insumo*",
            ],
            PurposeCategory::Services => &[
                "servicio*",
                "limpieza",
                "seguridad",
                "vigilancia",
                "transporte*",
                "alimentacion",
                "mantenimiento*",
                "alquiler*",
                "arrendamiento*",
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PurposeCategory::Construction => "construcción",
            PurposeCategory::Consulting => "consultoría",
            PurposeCategory::Technology => "tecnología",
            PurposeCategory::Supply => "provisión de bienes",
            PurposeCategory::Services => "servicios",
        }
    }

    /// CIIU sections and divisions accepted for this kind of procurement.
    fn accepts(&self, code: &ActivityCode) -> bool {
        let division = code.division;
        match self {
            PurposeCategory::Construction => code.section == 'F',
            PurposeCategory::Consulting => code.section == 'M' && (69..=74).contains(&division),
            PurposeCategory::Technology => {
                (code.section == 'J' && matches!(division, 58 | 61 | 62 | 63))
                    || (code.section == 'G' && matches!(division, 46 | 47))
            }
            PurposeCategory::Supply => {
                matches!(code.section, 'C' | 'G') || (code.section == 'A' && division <= 3)
            }
            PurposeCategory::Services => match code.section {
                'N' => (77..=82).contains(&division),
                'S' => matches!(division, 95 | 96),
                'H' => (49..=53).contains(&division),
                'I' => division == 56,
                'E' => (37..=39).contains(&division),
                _ => false,
            },
        }
    }
}

/// Classify free text by purpose keywords; `None` when nothing matches.
pub fn purpose_category(text: &str) -> Option<PurposeCategory> {
    let tokens = tokenize(text);
    let mut best: Option<(PurposeCategory, usize)> = None;
    for category in PurposeCategory::ALL {
        let hits = category
            .keywords()
            .iter()
            .filter(|keyword| contains_phrase(&tokens, keyword))
            .count();
        if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
            best = Some((category, hits));
        }
    }
    best.map(|(category, _)| category)
}

static CIIU_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-U])(\d{2})\d{0,2}(?:\.\d{1,2})?\b").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActivityCode {
    section: char,
    division: u8,
}

fn activity_code(activity: &str) -> Option<ActivityCode> {
    let upper = activity.to_uppercase();
    let captures = CIIU_CODE.captures(&upper)?;
    let section = captures[1].chars().next()?;
    let division = captures[2].parse().ok()?;
    Some(ActivityCode { section, division })
}

/// Whether the activity suits the purpose, or `None` when either side
/// cannot be resolved. Activities without a CIIU code are classified by
/// their description.
pub fn activity_coherent(activity: &str, purpose: &str) -> Option<bool> {
    let category = purpose_category(purpose)?;
    match activity_code(activity) {
        Some(code) => Some(category.accepts(&code)),
        None => purpose_category(activity).map(|described| described == category),
    }
}

pub(crate) struct CoherenceAssessment {
    pub(crate) coherent: bool,
    pub(crate) warning: Option<EvaluationWarning>,
}

/// Unresolved coherence counts as not coherent and leaves a warning.
pub(crate) fn assess(activity: Option<&str>, purpose: Option<&str>) -> CoherenceAssessment {
    let unresolved = |subject: &str, message: &str| CoherenceAssessment {
        coherent: false,
        warning: Some(EvaluationWarning::coherence(subject, message)),
    };

    let Some(activity) = activity.filter(|value| !value.trim().is_empty()) else {
        return unresolved("actividadPrincipal", "Actividad económica no declarada");
    };
    let Some(purpose) = purpose.filter(|value| !value.trim().is_empty()) else {
        return unresolved("objetoContrato", "Objeto del contrato no identificado");
    };

    match activity_coherent(activity, purpose) {
        Some(coherent) => CoherenceAssessment {
            coherent,
            warning: None,
        },
        None => unresolved(
            activity,
            &format!("No se pudo relacionar la actividad {activity} con el objeto \"{purpose}\""),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_purposes() {
        assert_eq!(
            purpose_category("Construcción de edificio administrativo de 5 plantas"),
            Some(PurposeCategory::Construction)
        );
        assert_eq!(
            purpose_category("Adquisición de insumos médicos"),
            Some(PurposeCategory::Supply)
        );
        assert_eq!(
            purpose_category("Consultoría para estudios de factibilidad"),
            Some(PurposeCategory::Consulting)
        );
        assert_eq!(purpose_category("Varios"), None);
    }

    #[test]
    fn construction_codes_match_construction_purposes() {
        let purpose = "Construcción de edificio administrativo";
        assert_eq!(activity_coherent("F4100.10", purpose), Some(true));
        assert_eq!(
            activity_coherent(
                "F4100.10 - CONSTRUCCIÓN DE EDIFICIOS COMPLETOS Y DE PARTES DE EDIFICIOS",
                purpose
            ),
            Some(true)
        );
        assert_eq!(activity_coherent("G4690.00", purpose), Some(false));
    }

    #[test]
    fn described_activity_without_code_is_classified() {
        assert_eq!(
            activity_coherent("Servicios de limpieza de oficinas", "Servicio de limpieza"),
            Some(true)
        );
        assert_eq!(activity_coherent("Actividades diversas", "Servicio de limpieza"), None);
    }

    #[test]
    fn missing_inputs_warn() {
        let assessment = assess(None, Some("Construcción de aulas"));
        assert!(!assessment.coherent);
        assert!(assessment.warning.is_some());

        let assessment = assess(Some("F4100.10"), Some("Construcción de aulas"));
        assert!(assessment.coherent);
        assert!(assessment.warning.is_none());
    }
}

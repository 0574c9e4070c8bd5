use std::sync::LazyLock;

use regex::Regex;

use super::terms::Candidate;
use crate::workflows::tender::lexicon::{find_phrase, fold, stem, tokenize};

/// Phrases that deny the requirement is met.
const NEGATIONS: &[&str] = &[
    "no presenta*",
    "no se presenta*",
    "no adjunt*",
    "no se adjunt*",
    "no cuent*",
    "no contamos",
    "no dispon*",
    "no pose*",
    "no tien*",
    "no tenemos",
    "no incluy*",
    "no se incluy*",
    "no cumpl*",
    "no acredit*",
    "no aplica",
    "carec*",
    "pendiente*",
    "en tramite",
    "vencid*",
    "caducad*",
    "sin garantia",
    "sin poliza",
    "sin experiencia",
];

/// Guarantee instruments; offering one kind when another is required is a substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Instrument {
    BankGuarantee,
    InsurancePolicy,
    Surety,
    Cheque,
    Deposit,
    PromissoryNote,
}

impl Instrument {
    const ALL: [Instrument; 6] = [
        Instrument::BankGuarantee,
        Instrument::InsurancePolicy,
        Instrument::Surety,
        Instrument::Cheque,
        Instrument::Deposit,
        Instrument::PromissoryNote,
    ];

    fn phrases(&self) -> &'static [&'static str] {
        match self {
            Instrument::BankGuarantee => &[
                "garantia bancaria",
                "garantia incondicional",
                "carta de credito",
                "aval bancario",
            ],
            Instrument::InsurancePolicy => &["poliza*"],
            Instrument::Surety => &["fianza*"],
            Instrument::Cheque => &["cheque*"],
            Instrument::Deposit => &["certificado de deposito", "deposito a plazo", "efectivo"],
            Instrument::PromissoryNote => &["pagare*", "letra de cambio"],
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Instrument::BankGuarantee => "garantía bancaria",
            Instrument::InsurancePolicy => "póliza de seguro",
            Instrument::Surety => "fianza",
            Instrument::Cheque => "cheque",
            Instrument::Deposit => "depósito",
            Instrument::PromissoryNote => "pagaré",
        }
    }
}

fn instruments(tokens: &[String]) -> Vec<Instrument> {
    Instrument::ALL
        .into_iter()
        .filter(|instrument| find_phrase(tokens, instrument.phrases()).is_some())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundKind {
    Min,
    Max,
}

/// Numeric bound stated by a requirement, e.g. `mínimo 5 proyectos`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    kind: BoundKind,
    value: u64,
    unit: String,
    unit_stem: String,
}

static MIN_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:minim[oa]s?|al menos|no menor(?:es)? (?:a|de))\s+(?:de\s+)?(\d+)\s+([a-z]+)")
        .expect("valid regex")
});
static MIN_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+([a-z]+)\s+(?:como\s+)?minim").expect("valid regex")
});
static MAX_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:maxim[oa]s?|no mayor(?:es)? (?:a|de))\s+(?:de\s+)?(\d+)\s+([a-z]+)")
        .expect("valid regex")
});
static MAX_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+([a-z]+)\s+(?:como\s+)?maxim").expect("valid regex")
});
static QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+([a-z]+)").expect("valid regex"));

fn bounds(folded: &str) -> Vec<Bound> {
    let sources: [(&Regex, BoundKind); 4] = [
        (&*MIN_BEFORE, BoundKind::Min),
        (&*MIN_AFTER, BoundKind::Min),
        (&*MAX_BEFORE, BoundKind::Max),
        (&*MAX_AFTER, BoundKind::Max),
    ];
    let mut found: Vec<Bound> = Vec::new();
    for (regex, kind) in sources {
        for captures in regex.captures_iter(folded) {
            let Ok(value) = captures[1].parse::<u64>() else {
                continue;
            };
            let unit = captures[2].to_string();
            let bound = Bound {
                kind,
                value,
                unit_stem: stem(&unit),
                unit,
            };
            if !found.contains(&bound) {
                found.push(bound);
            }
        }
    }
    found
}

/// Reason a strong evidence cannot confirm the requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Conflict {
    Negated { marker: &'static str },
    Substitute {
        offered: Vec<Instrument>,
        required: Vec<Instrument>,
    },
    Shortfall { required: u64, stated: u64, unit: String },
    Excess { limit: u64, stated: u64, unit: String },
}

fn join_labels(instruments: &[Instrument]) -> String {
    instruments
        .iter()
        .map(Instrument::label)
        .collect::<Vec<_>>()
        .join(" / ")
}

impl Conflict {
    pub(crate) fn observation(&self) -> String {
        match self {
            Conflict::Negated { marker } => format!(
                "La oferta declara no cumplir el requisito (\"{}\")",
                marker.trim_end_matches('*')
            ),
            Conflict::Substitute { offered, required } => format!(
                "Instrumento distinto al requerido: se presenta {} y se exige {}",
                join_labels(offered),
                join_labels(required)
            ),
            Conflict::Shortfall {
                required,
                stated,
                unit,
            } => format!("Se acreditan {stated} {unit}, se exige un mínimo de {required}"),
            Conflict::Excess {
                limit,
                stated,
                unit,
            } => format!("Se ofrecen {stated} {unit}, el máximo permitido es {limit}"),
        }
    }
}

/// What a requirement demands beyond its key terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequirementConstraints {
    instruments: Vec<Instrument>,
    bounds: Vec<Bound>,
}

impl RequirementConstraints {
    pub(crate) fn of(text: &str) -> Self {
        Self {
            instruments: instruments(&tokenize(text)),
            bounds: bounds(&fold(text)),
        }
    }

    /// First reason the candidate contradicts the requirement, if any.
    pub(crate) fn conflict(&self, candidate: &Candidate) -> Option<Conflict> {
        if let Some(marker) = find_phrase(&candidate.tokens, NEGATIONS) {
            return Some(Conflict::Negated { marker });
        }

        if !self.instruments.is_empty() {
            let offered = instruments(&candidate.tokens);
            let honoured = offered
                .iter()
                .any(|instrument| self.instruments.contains(instrument));
            if !offered.is_empty() && !honoured {
                return Some(Conflict::Substitute {
                    offered,
                    required: self.instruments.clone(),
                });
            }
        }

        let stated: Vec<(u64, String)> = QUANTITY
            .captures_iter(&candidate.folded)
            .filter_map(|captures| {
                let value = captures[1].parse::<u64>().ok()?;
                Some((value, stem(&captures[2])))
            })
            .collect();

        for bound in &self.bounds {
            let matching: Vec<u64> = stated
                .iter()
                .filter(|(_, unit)| *unit == bound.unit_stem)
                .map(|(value, _)| *value)
                .collect();
            let Some(&best) = (match bound.kind {
                BoundKind::Min => matching.iter().max(),
                BoundKind::Max => matching.iter().min(),
            }) else {
                continue;
            };
            match bound.kind {
                BoundKind::Min if best < bound.value => {
                    return Some(Conflict::Shortfall {
                        required: bound.value,
                        stated: best,
                        unit: bound.unit.clone(),
                    });
                }
                BoundKind::Max if best > bound.value => {
                    return Some(Conflict::Excess {
                        limit: bound.value,
                        stated: best,
                        unit: bound.unit.clone(),
                    });
                }
                BoundKind::Min | BoundKind::Max => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tender::extraction::TextSegment;
    use crate::workflows::tender::matching::terms::candidates;

    fn candidate(text: &str) -> Candidate {
        let segment = TextSegment {
            text: text.to_string(),
            page: 1,
            index: 0,
            bbox: None,
        };
        candidates(&[segment]).remove(0)
    }

    #[test]
    fn detects_minimum_shortfall() {
        let constraints =
            RequirementConstraints::of("Experiencia mínima de 5 proyectos similares");
        let conflict = constraints
            .conflict(&candidate("Acreditamos experiencia en 3 proyectos similares."))
            .expect("shortfall detected");
        assert_eq!(
            conflict,
            Conflict::Shortfall {
                required: 5,
                stated: 3,
                unit: "proyectos".to_string()
            }
        );
        assert!(constraints
            .conflict(&candidate("Acreditamos experiencia en 7 proyectos similares."))
            .is_none());
    }

    #[test]
    fn detects_maximum_excess() {
        let constraints = RequirementConstraints::of("Plazo máximo de 180 días");
        assert!(matches!(
            constraints.conflict(&candidate("El plazo de ejecución será de 200 días.")),
            Some(Conflict::Excess { limit: 180, stated: 200, .. })
        ));
    }

    #[test]
    fn detects_substitute_instrument() {
        let constraints = RequirementConstraints::of(
            "Garantía de fiel cumplimiento mediante garantía bancaria incondicional",
        );
        let conflict = constraints
            .conflict(&candidate("Se adjunta póliza de seguro de fiel cumplimiento."))
            .expect("substitution detected");
        assert_eq!(
            conflict.observation(),
            "Instrumento distinto al requerido: se presenta póliza de seguro y se exige garantía bancaria"
        );
    }

    #[test]
    fn detects_negation() {
        let constraints = RequirementConstraints::of("Certificado de cumplimiento tributario");
        assert!(matches!(
            constraints.conflict(&candidate(
                "El certificado de cumplimiento tributario se encuentra en trámite."
            )),
            Some(Conflict::Negated { .. })
        ));
    }
}

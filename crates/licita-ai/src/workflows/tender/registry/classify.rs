use crate::workflows::tender::domain::RequirementCategory;
use crate::workflows::tender::lexicon::{contains_phrase, find_phrase};

/// Section titles that introduce requirement lists.
const REQUIREMENT_SECTIONS: &[&str] = &[
    "requisito*",
    "documentos habilitantes",
    "documentacion requerida",
    "documentos requeridos",
    "condicion*",
    "obligaciones del contratista",
    "obligaciones del oferente",
    "garantia*",
    "experiencia*",
    "personal tecnico",
    "equipo minimo",
    "integridad de la oferta",
    "criterios de evaluacion",
    "especificaciones tecnicas",
    "plazo*",
];

const OBLIGATION_MARKERS: &[&str] = &[
    "debera*",
    "deben",
    "debe",
    "obligatori*",
    "se requiere",
    "requerid*",
    "exig*",
    "indispensable",
    "imprescindible",
    "tendra que",
    "tendran que",
    "es necesario",
    "sera necesario",
    "al menos",
    "como minimo",
    "minimo",
    "minima",
    "presentara*",
    "acreditar*",
    "contar con",
    "se solicita",
    "prohibido",
];

const INFORMATIONAL_MARKERS: &[&str] = &[
    "podra*",
    "opcional*",
    "referencial*",
    "sugiere",
    "se recomienda",
    "recomendable",
    "de ser posible",
    "preferentemente",
    "facultativ*",
    "informativ*",
    "a manera de referencia",
];

/// Outcome of the obligation heuristics for one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Obligation {
    Mandatory,
    Informational,
    /// Both kinds of marker present.
    Conflicting,
    /// No marker at all.
    Unmarked,
}

pub(crate) fn is_requirement_section(tokens: &[String]) -> bool {
    find_phrase(tokens, REQUIREMENT_SECTIONS).is_some()
}

/// Rewrite negated forms before marker lookup: `no es obligatorio` reads as
/// optional and `no podrá` as a prohibition.
fn canonical_tokens(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        let current = tokens[index].as_str();
        let next = tokens.get(index + 1).map(String::as_str);
        let after = tokens.get(index + 2).map(String::as_str);

        if current == "no" {
            if matches!(next, Some("es" | "sera" | "son" | "seran"))
                && after.is_some_and(|token| token.starts_with("obligatori"))
            {
                out.push("opcional".to_string());
                index += 3;
                continue;
            }
            if next.is_some_and(|token| token.starts_with("podr")) {
                out.push("prohibido".to_string());
                index += 2;
                continue;
            }
        }
        out.push(tokens[index].clone());
        index += 1;
    }
    out
}

pub(crate) fn obligation(tokens: &[String]) -> Obligation {
    let canonical = canonical_tokens(tokens);
    let mandatory = find_phrase(&canonical, OBLIGATION_MARKERS).is_some();
    let informational = find_phrase(&canonical, INFORMATIONAL_MARKERS).is_some();
    match (mandatory, informational) {
        (true, true) => Obligation::Conflicting,
        (true, false) => Obligation::Mandatory,
        (false, true) => Obligation::Informational,
        (false, false) => Obligation::Unmarked,
    }
}

const CATEGORY_KEYWORDS: &[(RequirementCategory, &[&str])] = &[
    (
        RequirementCategory::CondicionesLegales,
        &[
            "contratista",
            "ley",
            "norma",
            "responsabilidad",
            "clausula",
            "contrato",
            "incumplimiento",
            "ruc",
            "representante legal",
            "escritura",
            "nombramiento",
            "declaracion juramentada",
        ],
    ),
    (
        RequirementCategory::RequisitosTecnicos,
        &[
            "entrega",
            "material",
            "especificacion",
            "obra",
            "tecnico",
            "tecnica",
            "alcance",
            "documentacion",
            "procedimiento",
            "experiencia",
            "proyecto",
            "personal",
            "equipo",
            "certificacion",
        ],
    ),
    (
        RequirementCategory::CondicionesEconomicas,
        &[
            "presupuesto",
            "costo",
            "pago",
            "monto",
            "precio",
            "tarifa",
            "anticipo",
            "factura",
            "capital",
            "patrimonio",
        ],
    ),
    (
        RequirementCategory::GarantiasYPolizas,
        &[
            "garantia",
            "poliza",
            "seguro",
            "fianza",
            "caucion",
            "aval",
            "garantia de cumplimiento",
            "garantia de calidad",
            "fiel cumplimiento",
            "buen uso",
        ],
    ),
    (
        RequirementCategory::PlazosYEntregables,
        &[
            "plazo",
            "entregable",
            "cronograma",
            "hito",
            "milestone",
            "entrega parcial",
            "fecha de entrega",
            "vencimiento",
            "deadline",
        ],
    ),
];

/// Tie-break order, most specific first.
const PRIORITY: &[RequirementCategory] = &[
    RequirementCategory::GarantiasYPolizas,
    RequirementCategory::PlazosYEntregables,
    RequirementCategory::CondicionesEconomicas,
    RequirementCategory::RequisitosTecnicos,
    RequirementCategory::CondicionesLegales,
];

fn keyword_hits(tokens: &[String], keyword: &str) -> usize {
    if keyword.contains(' ') {
        let parts: Vec<&str> = keyword.split_whitespace().collect();
        return tokens
            .windows(parts.len())
            .filter(|window| window.iter().zip(&parts).all(|(token, part)| token == part))
            .count();
    }
    tokens
        .iter()
        .filter(|token| {
            token.as_str() == keyword
                || token
                    .strip_prefix(keyword)
                    .is_some_and(|rest| rest == "s" || rest == "es")
        })
        .count()
}

/// Keyword-count category with simple plural inflection and fixed tie-break.
pub(crate) fn categorize(tokens: &[String]) -> RequirementCategory {
    let mut best: Option<(RequirementCategory, usize)> = None;
    for category in PRIORITY {
        let hits: usize = CATEGORY_KEYWORDS
            .iter()
            .filter(|(candidate, _)| candidate == category)
            .flat_map(|(_, keywords)| keywords.iter())
            .map(|keyword| keyword_hits(tokens, keyword))
            .sum();
        if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
            best = Some((*category, hits));
        }
    }
    best.map_or(RequirementCategory::Otro, |(category, _)| category)
}

/// Heading naming the contract purpose, e.g. `OBJETO DEL CONTRATO`.
pub(crate) fn is_purpose_heading(tokens: &[String]) -> bool {
    contains_phrase(tokens, "objeto") && tokens.len() <= 6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tender::lexicon::tokenize;

    #[test]
    fn negated_obligation_reads_as_informational() {
        let tokens = tokenize("La visita técnica no es obligatoria.");
        assert_eq!(obligation(&tokens), Obligation::Informational);
    }

    #[test]
    fn prohibition_reads_as_mandatory() {
        let tokens = tokenize("El contratista no podrá subcontratar la obra.");
        assert_eq!(obligation(&tokens), Obligation::Mandatory);
    }

    #[test]
    fn mixed_markers_conflict() {
        let tokens = tokenize("El oferente deberá, de ser posible, adjuntar fotografías.");
        assert_eq!(obligation(&tokens), Obligation::Conflicting);
    }

    #[test]
    fn categories_follow_keyword_counts_and_priority() {
        assert_eq!(
            categorize(&tokenize("Garantía de fiel cumplimiento del contrato")),
            RequirementCategory::GarantiasYPolizas
        );
        assert_eq!(
            categorize(&tokenize("Plazo de ejecución de 120 días")),
            RequirementCategory::PlazosYEntregables
        );
        assert_eq!(
            categorize(&tokenize("Capital suscrito y pago de tarifas")),
            RequirementCategory::CondicionesEconomicas
        );
        assert_eq!(
            categorize(&tokenize("Lugar de reunión")),
            RequirementCategory::Otro
        );
    }
}

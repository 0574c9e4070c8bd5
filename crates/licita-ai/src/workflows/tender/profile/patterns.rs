//! Field patterns for bidder proposals.

use std::sync::LazyLock;

use regex::Regex;

use crate::workflows::tender::extraction::TextSegment;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid regex")
}

static LABELED_RUC: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\bR\.?U\.?C\.?\s*(?:N[°º.o]*\s*)?[:\-]?\s*(\d{13})\b"));
static ANY_RUC: LazyLock<Regex> = LazyLock::new(|| pattern(r"\b(\d{13})\b"));
static LEGAL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\b(?:raz[oó]n\s+social|nombre\s+del\s+oferente|denominaci[oó]n)\s*[:\-]\s*(.+)")
});
static NAME_TAIL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\s*[,;]?\s*\b(?:R\.?U\.?C|con\s+domicilio|domiciliad)"));
static LABELED_ACTIVITY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)(?:CIIU|actividad\s+(?:econ[oó]mica\s+)?(?:principal)?)\s*[:\-]?\s*([A-U]\d{4}(?:\.\d{2})?)\b")
});
static ANY_ACTIVITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\b([A-U]\d{4}(?:\.\d{2})?)\b"));
static PURPOSE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)\bobjeto(?:\s+del\s+(?:contrato|proceso))?\s*[:\-]\s*(.{8,})")
});
static CAPITAL: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)capital\s+(?:suscrito|social|pagado)\s*(?:es\s+de|de|:)?\s*(?:USD|US\$|\$)?\s*(\d[\d.,]*)")
});
static OFFERED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)(?:monto|valor|precio|presupuesto)\s+(?:total\s+)?(?:ofertado|de\s+la\s+oferta|propuesto)\s*(?:es\s+de|asciende\s+a|de|:)?\s*(?:USD|US\$|\$)?\s*(\d[\d.,]*)")
});
static EXECUTION_TERM: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)plazo\s+(?:de\s+)?(?:ejecuci[oó]n|entrega)[^\d]{0,20}(\d+\s+(?:d[ií]as(?:\s+(?:calendario|h[aá]biles|laborables))?|meses|mes|semanas|a[nñ]os))")
});
static OFFER_VALIDITY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)validez\s+(?:de\s+(?:la\s+)?oferta)?[^\d]{0,20}(\d+\s+(?:d[ií]as(?:\s+(?:calendario|h[aá]biles))?|meses))")
});

/// Attributes a proposal states about its bidder.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProposalFields {
    pub(crate) legal_name: Option<String>,
    pub(crate) tax_id: Option<String>,
    pub(crate) activity: Option<String>,
    pub(crate) purpose: Option<String>,
    pub(crate) capital: Option<f64>,
    pub(crate) offered_amount: Option<f64>,
    pub(crate) execution_term: Option<String>,
    pub(crate) offer_validity: Option<String>,
}

fn first_capture(segments: &[TextSegment], regex: &Regex) -> Option<String> {
    segments.iter().find_map(|segment| {
        regex
            .captures(&segment.text)
            .map(|captures| captures[1].trim().to_string())
    })
}

fn clean_name(raw: &str) -> Option<String> {
    let cut = match NAME_TAIL.find(raw) {
        Some(tail) => &raw[..tail.start()],
        None => raw,
    };
    let name = cut.trim().trim_end_matches([',', ';', ':']).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// First occurrence of each field, scanning segments in document order.
pub(crate) fn scan(segments: &[TextSegment]) -> ProposalFields {
    ProposalFields {
        legal_name: first_capture(segments, &LEGAL_NAME).and_then(|raw| clean_name(&raw)),
        tax_id: first_capture(segments, &LABELED_RUC).or_else(|| first_capture(segments, &ANY_RUC)),
        activity: first_capture(segments, &LABELED_ACTIVITY)
            .or_else(|| first_capture(segments, &ANY_ACTIVITY))
            .map(|code| code.to_uppercase()),
        purpose: first_capture(segments, &PURPOSE)
            .map(|text| text.trim_end_matches('.').trim().to_string()),
        capital: first_capture(segments, &CAPITAL).and_then(|raw| parse_amount(&raw)),
        offered_amount: first_capture(segments, &OFFERED_AMOUNT).and_then(|raw| parse_amount(&raw)),
        execution_term: first_capture(segments, &EXECUTION_TERM),
        offer_validity: first_capture(segments, &OFFER_VALIDITY),
    }
}

/// Parse `1.250.000,50`, `1,250,000.50` or `150000` into a number.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim().trim_end_matches(['.', ',']);
    if raw.is_empty() {
        return None;
    }

    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if dot > comma => raw.replace(',', ""),
        (Some(_), Some(_)) => raw.replace('.', "").replace(',', "."),
        (Some(_), None) => normalize_single(raw, '.'),
        (None, Some(_)) => normalize_single(raw, ','),
        (None, None) => raw.to_string(),
    };
    normalized.parse::<f64>().ok()
}

/// With one separator kind: repeated or followed by exactly three digits means thousands.
fn normalize_single(raw: &str, separator: char) -> String {
    let occurrences = raw.matches(separator).count();
    let decimals = raw.rsplit(separator).next().map_or(0, str::len);
    if occurrences > 1 || decimals == 3 {
        raw.replace(separator, "")
    } else {
        raw.replace(separator, ".")
    }
}

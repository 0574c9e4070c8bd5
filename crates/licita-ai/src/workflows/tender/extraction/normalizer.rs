//! Line-level cleanup applied to every extracted page.

use std::sync::LazyLock;

use regex::Regex;

const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{ad}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã‘", "Ñ"),
    ("Ã“", "Ó"),
    ("Ã‰", "É"),
    ("Â°", "°"),
    ("Âº", "º"),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€œ", "\""),
    ("â€™", "'"),
    ("â€¢", "-"),
    ("â€\u{9d}", "\""),
];

const LIGATURES: &[(char, &str)] = &[('ﬁ', "fi"), ('ﬂ', "fl"), ('ﬀ', "ff"), ('ﬃ', "ffi")];

/// Repair encoding damage and collapse whitespace inside a line.
pub(crate) fn clean_line(raw: &str) -> String {
    static SPACES: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let mut text = raw.to_string();
    for (wrong, right) in MOJIBAKE {
        if text.contains(wrong) {
            text = text.replace(wrong, right);
        }
    }
    if text.chars().any(|c| LIGATURES.iter().any(|(lig, _)| *lig == c)) {
        let mut repaired = String::with_capacity(text.len());
        for c in text.chars() {
            match LIGATURES.iter().find(|(lig, _)| *lig == c) {
                Some((_, expanded)) => repaired.push_str(expanded),
                None => repaired.push(c),
            }
        }
        text = repaired;
    }
    let text: String = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    SPACES.replace_all(text.trim(), " ").into_owned()
}

/// Institutional headers, bare page numbers and separator rules.
pub(crate) fn is_noise(line: &str) -> bool {
    static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        [
            r"(?i)direcci[oó]n:.*plataforma gubernamental.*quito",
            r"(?i)sercop.*servicio nacional de contrataci[oó]n p[uú]blica",
            r"(?i)^gobierno.*ecuador",
            r"(?i)c[oó]digo postal:\s*\d{6}",
            r"(?i)^p[aá]gina\s+\d+(\s+de\s+\d+)?$",
            r"^\d{1,4}$",
            r"^\d{1,4}\s*/\s*\d{1,4}$",
            r"^[-_=.·•*\s]+$",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
    });

    let trimmed = line.trim();
    trimmed.is_empty() || NOISE.iter().any(|pattern| pattern.is_match(trimmed))
}

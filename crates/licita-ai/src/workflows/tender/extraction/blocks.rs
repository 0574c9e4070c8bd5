//! Groups text-layer lines into paragraph, list-item and heading blocks.

use std::sync::LazyLock;

use regex::Regex;

use super::normalizer::{clean_line, is_noise};

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:\.\d{1,3})+\.?|\d{1,3}[.)]|[a-zA-Z][.)]|[-•*·–])\s+")
        .expect("valid regex")
});

static SECTION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:secci[oó]n|cap[ií]tulo|anexo|t[ií]tulo)\b").expect("valid regex")
});

static ROMAN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[IVXL]{1,5}[.)]\s+\S").expect("valid regex"));

/// Byte length of the leading list marker, including trailing whitespace.
pub(crate) fn list_marker(line: &str) -> Option<usize> {
    LIST_MARKER.find(line).map(|found| found.end())
}

/// Line text without its list marker.
pub(crate) fn strip_marker(line: &str) -> &str {
    match list_marker(line) {
        Some(end) => line[end..].trim_start(),
        None => line,
    }
}

/// Short title-like line: `SECCIÓN III`, `IV. CONDICIONES`, `4. REQUISITOS MÍNIMOS`
/// or a brief label ending in a colon.
pub(crate) fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 90 || trimmed.ends_with('.') {
        return false;
    }
    if SECTION_KEYWORD.is_match(trimmed) || ROMAN_HEADING.is_match(trimmed) {
        return true;
    }

    let body = strip_marker(trimmed);
    if body.ends_with(':') && body.split_whitespace().count() <= 8 {
        return true;
    }

    let letters: Vec<char> = body.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 4 {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper * 10 >= letters.len() * 8
}

/// Split one page of text into cleaned blocks, dropping noise lines.
pub(crate) fn split_blocks(page: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for raw in page.lines() {
        if raw.trim().is_empty() {
            flush(&mut blocks, &mut current);
            continue;
        }
        if is_noise(raw) {
            continue;
        }
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }

        if is_heading(&line) {
            flush(&mut blocks, &mut current);
            blocks.push(line);
            continue;
        }
        if list_marker(&line).is_some() {
            flush(&mut blocks, &mut current);
        }
        append_line(&mut current, &line);
    }
    flush(&mut blocks, &mut current);
    blocks
}

fn append_line(current: &mut String, line: &str) {
    if current.is_empty() {
        current.push_str(line);
        return;
    }
    let hyphenated = current.ends_with('-')
        && current
            .chars()
            .rev()
            .nth(1)
            .is_some_and(char::is_alphabetic)
        && line.chars().next().is_some_and(char::is_lowercase);
    if hyphenated {
        current.pop();
    } else {
        current.push(' ');
    }
    current.push_str(line);
}

fn flush(blocks: &mut Vec<String>, current: &mut String) {
    if !current.trim().is_empty() {
        blocks.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_list_markers() {
        assert!(list_marker("1. Copia del RUC").is_some());
        assert!(list_marker("2.3 Experiencia general").is_some());
        assert!(list_marker("b) Garantía técnica").is_some());
        assert!(list_marker("• Personal técnico").is_some());
        assert!(list_marker("15 días calendario").is_none());
        assert_eq!(strip_marker("a) Póliza de seguro"), "Póliza de seguro");
    }

    #[test]
    fn detects_headings() {
        assert!(is_heading("SECCIÓN III"));
        assert!(is_heading("4. REQUISITOS MÍNIMOS"));
        assert!(is_heading("Documentos habilitantes:"));
        assert!(!is_heading("1. El oferente presentará su RUC actualizado."));
    }

    #[test]
    fn groups_lines_into_blocks() {
        let page = "REQUISITOS MÍNIMOS\n1. El oferente deberá presentar la garantía de fiel cumpli-\nmiento del contrato.\n2. Experiencia mínima de 5 proyectos.\n\n7\nTexto libre de cierre\ncontinúa aquí.";
        let blocks = split_blocks(page);
        assert_eq!(
            blocks,
            vec![
                "REQUISITOS MÍNIMOS".to_string(),
                "1. El oferente deberá presentar la garantía de fiel cumplimiento del contrato."
                    .to_string(),
                "2. Experiencia mínima de 5 proyectos.".to_string(),
                "Texto libre de cierre continúa aquí.".to_string(),
            ]
        );
    }
}

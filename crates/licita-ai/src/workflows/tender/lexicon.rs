//! Spanish text helpers shared by the registry builder and the matcher.

/// Lowercase and strip diacritics so `Garantía` and `GARANTIA` compare equal.
pub(crate) fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Folded alphanumeric tokens in document order.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

const STEM_LEN: usize = 6;

/// Prefix stem, enough to merge `garantia`/`garantias` and `presentar`/`presentara`.
pub(crate) fn stem(token: &str) -> String {
    token.chars().take(STEM_LEN).collect()
}

const STOPWORDS: &[&str] = &[
    "a", "al", "ante", "bajo", "cada", "como", "con", "contra", "cual", "cuales", "de", "del",
    "desde", "donde", "durante", "e", "el", "ella", "ellos", "en", "entre", "es", "esta", "este",
    "esto", "estos", "estas", "ha", "han", "hasta", "la", "las", "le", "les", "lo", "los", "mas",
    "mismo", "misma", "ni", "o", "otro", "otra", "para", "pero", "por", "que", "se", "segun",
    "ser", "si", "sin", "sobre", "son", "su", "sus", "tal", "tambien", "u", "un", "una", "uno",
    "unos", "unas", "y", "ya", "deben", "debe", "debera", "deberan", "sera", "seran", "presentar",
    "presentara", "contar", "contara", "oferente", "oferentes", "contratista", "minimo",
    "minima", "maximo", "maxima", "menos", "caso", "dicho", "dicha", "mediante",
    "cumplir", "cumplira", "obligatorio", "obligatoria", "requiere", "requisito", "siguiente",
    "siguientes",
];

pub(crate) fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Stemmed, de-duplicated content terms of a clause, numbers excluded.
pub(crate) fn key_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if token.chars().count() < 3 || is_stopword(&token) {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let stemmed = stem(&token);
        if !terms.contains(&stemmed) {
            terms.push(stemmed);
        }
    }
    terms
}

/// Whether `phrase` occurs as consecutive tokens. A part ending in `*` matches
/// any token starting with that prefix.
pub(crate) fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > tokens.len() {
        return false;
    }
    tokens.windows(parts.len()).any(|window| {
        window
            .iter()
            .zip(&parts)
            .all(|(token, part)| match part.strip_suffix('*') {
                Some(prefix) => token.starts_with(prefix),
                None => token == part,
            })
    })
}

/// First phrase from `phrases` present in `tokens`.
pub(crate) fn find_phrase<'a>(tokens: &[String], phrases: &[&'a str]) -> Option<&'a str> {
    phrases
        .iter()
        .copied()
        .find(|phrase| contains_phrase(tokens, phrase))
}

const ABBREVIATIONS: &[&str] = &[
    "art", "arts", "num", "nro", "sr", "sra", "dr", "dra", "ing", "arq", "lic", "econ",
    "abg", "etc", "pag", "inc", "lit", "cap", "min", "max", "aprox", "ej", "cia", "ltda",
];

/// Split a paragraph into sentences on terminal punctuation followed by whitespace,
/// keeping abbreviations (`Art.`, `Nro.`) and decimals (`2.5`) intact.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for (index, &c) in chars.iter().enumerate() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }
        let next = chars.get(index + 1).copied();
        if !next.map_or(true, char::is_whitespace) {
            continue;
        }
        if c == '.' {
            let following = chars[index + 1..]
                .iter()
                .copied()
                .find(|c| !c.is_whitespace());
            if ends_with_abbreviation(&chars[start..index], following) {
                continue;
            }
        }
        push_sentence(&mut sentences, &chars[start..=index]);
        start = index + 1;
    }
    if start < chars.len() {
        push_sentence(&mut sentences, &chars[start..]);
    }
    sentences
}

/// `No.` only abbreviates "número" when a number follows (`No. 123`); a bare
/// `No.` is an answer and ends its sentence.
fn ends_with_abbreviation(chars: &[char], following: Option<char>) -> bool {
    let word: String = chars
        .iter()
        .rev()
        .take_while(|c| c.is_alphanumeric())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if word.is_empty() {
        return false;
    }
    let folded = fold(&word);
    if folded == "no" {
        return following.is_some_and(|c| c.is_ascii_digit());
    }
    (folded.chars().count() == 1 && folded.chars().all(char::is_alphabetic))
        || ABBREVIATIONS.contains(&folded.as_str())
}

fn push_sentence(sentences: &mut Vec<String>, chars: &[char]) {
    let sentence: String = chars.iter().collect();
    let trimmed = sentence.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
}

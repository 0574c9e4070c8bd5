use std::collections::HashSet;

use crate::workflows::tender::domain::SourceSpan;
use crate::workflows::tender::extraction::TextSegment;
use crate::workflows::tender::lexicon::{fold, key_terms, split_sentences, stem, tokenize};

/// Stemmed content terms a proposal fragment must mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyTerms(Vec<String>);

impl KeyTerms {
    pub(crate) fn of(text: &str) -> Self {
        Self(key_terms(text))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Share of key terms present in the candidate, in `[0, 1]`.
    pub(crate) fn coverage(&self, candidate: &Candidate) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        let covered = self
            .0
            .iter()
            .filter(|term| candidate.stems.contains(*term))
            .count();
        covered as f64 / self.0.len() as f64
    }
}

/// One proposal sentence, pre-tokenized for repeated scoring.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) text: String,
    pub(crate) folded: String,
    pub(crate) tokens: Vec<String>,
    pub(crate) span: SourceSpan,
    stems: HashSet<String>,
}

impl Candidate {
    fn new(text: String, span: SourceSpan) -> Self {
        let tokens = tokenize(&text);
        let stems = tokens.iter().map(|token| stem(token)).collect();
        Self {
            folded: fold(&text),
            text,
            tokens,
            span,
            stems,
        }
    }
}

/// Sentence-level candidates in document order.
pub(crate) fn candidates(segments: &[TextSegment]) -> Vec<Candidate> {
    segments
        .iter()
        .flat_map(|segment| {
            let span = segment.span();
            split_sentences(&segment.text)
                .into_iter()
                .map(move |sentence| Candidate::new(sentence, span))
        })
        .collect()
}

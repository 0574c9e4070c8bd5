//! Requirement registry: the canonical, ordered list of tender clauses.

mod classify;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{EvaluationWarning, Requirement, RequirementId};
use super::extraction::blocks::{is_heading, list_marker, strip_marker};
use super::extraction::TextSegment;
use super::lexicon::{fold, key_terms, split_sentences, tokenize};
use classify::{categorize, is_purpose_heading, is_requirement_section, obligation, Obligation};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tender contains no recognizable requirements")]
    Empty,
}

/// Ordered requirements of one tender. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementRegistry {
    requirements: Vec<Requirement>,
    contract_purpose: Option<String>,
    warnings: Vec<EvaluationWarning>,
}

impl RequirementRegistry {
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn mandatory_count(&self) -> usize {
        self.requirements.iter().filter(|req| req.mandatory).count()
    }

    /// "Objeto del contrato" stated in the tender, if any.
    pub fn contract_purpose(&self) -> Option<&str> {
        self.contract_purpose.as_deref()
    }

    /// Ambiguous classifications recorded while building.
    pub fn warnings(&self) -> &[EvaluationWarning] {
        &self.warnings
    }
}

static INLINE_PURPOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\d.)\s]*(?:el\s+)?objeto\s+(?:del\s+contrato|del\s+proceso|de\s+la\s+contrataci[oó]n)\s*(?:es|ser[aá])?\s*[:.\-]?\s*(.{8,})",
    )
    .expect("valid regex")
});

fn purpose_text(raw: &str) -> String {
    raw.trim().trim_end_matches('.').trim_end().to_string()
}

#[derive(Default)]
struct BuildState {
    in_section: bool,
    awaiting_purpose: bool,
    contract_purpose: Option<String>,
    requirements: Vec<Requirement>,
    warnings: Vec<EvaluationWarning>,
    seen: HashSet<String>,
}

impl BuildState {
    fn push_clause(&mut self, clause: &str) {
        let clause = clause.trim();
        let tokens = tokenize(clause);
        if tokens.len() < 3 || key_terms(clause).is_empty() {
            return;
        }

        let verdict = obligation(&tokens);
        let mandatory = match (verdict, self.in_section) {
            (Obligation::Mandatory, _) => true,
            (Obligation::Conflicting, _) => true,
            (Obligation::Informational, true) => false,
            (Obligation::Unmarked, true) => true,
            (Obligation::Informational | Obligation::Unmarked, false) => return,
        };

        if !self.seen.insert(fold(clause)) {
            return;
        }

        let id = RequirementId::from_position(self.requirements.len());
        match verdict {
            Obligation::Conflicting => {
                warn!(requirement = %id.0, "clause carries obligation and optional markers");
                self.warnings.push(EvaluationWarning::ambiguous(
                    id.0.clone(),
                    "la cláusula contiene marcadores obligatorios y opcionales; se asume obligatoria",
                ));
            }
            Obligation::Unmarked => {
                warn!(requirement = %id.0, "clause without obligation marker treated as mandatory");
                self.warnings.push(EvaluationWarning::ambiguous(
                    id.0.clone(),
                    "la cláusula no indica si es obligatoria; se asume obligatoria",
                ));
            }
            Obligation::Mandatory | Obligation::Informational => {}
        }

        let category = categorize(&tokens);
        debug!(requirement = %id.0, ?category, mandatory, "requirement registered");
        self.requirements.push(Requirement {
            id,
            text: clause.to_string(),
            category,
            mandatory,
        });
    }

    fn visit(&mut self, segment: &TextSegment) {
        let text = segment.text.trim();
        let tokens = tokenize(text);

        if is_heading(text) {
            if is_purpose_heading(&tokens) {
                self.awaiting_purpose = true;
                self.in_section = false;
            } else {
                self.awaiting_purpose = false;
                self.in_section = is_requirement_section(&tokens)
                    || (text.ends_with(':')
                        && matches!(
                            obligation(&tokens),
                            Obligation::Mandatory | Obligation::Conflicting
                        ));
            }
            return;
        }

        if self.contract_purpose.is_none() {
            if let Some(captures) = INLINE_PURPOSE.captures(text) {
                self.contract_purpose = Some(purpose_text(&captures[1]));
                self.awaiting_purpose = false;
                return;
            }
            if self.awaiting_purpose {
                self.contract_purpose = Some(purpose_text(strip_marker(text)));
                self.awaiting_purpose = false;
                return;
            }
        }
        self.awaiting_purpose = false;

        if list_marker(text).is_some() {
            self.push_clause(strip_marker(text));
            return;
        }

        for sentence in split_sentences(text) {
            // A lead-in such as "deberá presentar lo siguiente:" opens a list.
            if sentence.ends_with(':') {
                if matches!(
                    obligation(&tokenize(&sentence)),
                    Obligation::Mandatory | Obligation::Conflicting
                ) {
                    self.in_section = true;
                }
                continue;
            }
            self.push_clause(&sentence);
        }
    }
}

/// Segment the tender into clauses and keep the requirements, in document order.
pub fn build_registry<I>(segments: I) -> Result<RequirementRegistry, RegistryError>
where
    I: IntoIterator<Item = TextSegment>,
{
    let mut state = BuildState::default();
    for segment in segments {
        state.visit(&segment);
    }

    if state.requirements.is_empty() {
        return Err(RegistryError::Empty);
    }

    Ok(RequirementRegistry {
        requirements: state.requirements,
        contract_purpose: state.contract_purpose,
        warnings: state.warnings,
    })
}

use std::collections::BTreeMap;

use serde::Serialize;

use super::tracks::{ABSTRACT_WORD_LIMIT, FieldKind, SELECT_PLACEHOLDER, TrackForm};
use crate::models::Track;

/// Every problem found in one submission, so the form can show them all at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Labels of missing required fields, in declared order.
    pub missing: Vec<String>,
    pub eligibility_ok: bool,
    pub length_ok: bool,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.eligibility_ok && self.length_ok
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.missing.is_empty() {
            problems.push(format!(
                "Please complete all required fields: {}.",
                self.missing.join(", ")
            ));
        }
        if !self.eligibility_ok {
            problems.push("Please confirm all eligibility checkboxes.".to_string());
        }
        if !self.length_ok {
            problems.push(format!(
                "Abstract appears to exceed {ABSTRACT_WORD_LIMIT} words. Please shorten."
            ));
        }
        problems
    }
}

pub fn validate(track: Track, fields: &BTreeMap<String, String>) -> ValidationResult {
    let form = TrackForm::for_track(track);

    let missing = form
        .required()
        .filter(|def| {
            let value = fields.get(def.name).map(|v| v.trim()).unwrap_or("");
            match def.kind {
                FieldKind::Select(_) => value.is_empty() || value == SELECT_PLACEHOLDER,
                _ => value.is_empty(),
            }
        })
        .map(|def| def.label.to_string())
        .collect();

    let eligibility_ok = form
        .eligibility
        .iter()
        .all(|cb| is_checked(fields.get(cb.name).map(String::as_str)));

    let length_ok = form.word_limited_field.is_none_or(|name| {
        fields
            .get(name)
            .is_none_or(|text| word_count(text) <= ABSTRACT_WORD_LIMIT)
    });

    ValidationResult {
        missing,
        eligibility_ok,
        length_ok,
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn is_checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "yes" | "1"
        )
    })
}

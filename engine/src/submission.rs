use std::collections::{HashMap, HashSet};

use serde::Serialize;

use formblocks::render::input_value;
use formblocks::{BlockKind, FieldValues};

use crate::dom::Dom;
use crate::error::EngineError;

/// One posted form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Ordered name/value pairs as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Submission {
    fields: Vec<Field>,
}

impl Submission {
    pub fn new() -> Self {
        Submission::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut submission = Submission::new();
        for (name, value) in pairs {
            submission.push(name, value);
        }
        submission
    }

    /// Every named `input`/`textarea` in document order. Submit buttons are
    /// left out since none has been pressed.
    pub fn from_dom(dom: &Dom) -> Self {
        let mut submission = Submission::new();
        for element in dom.root().descendants() {
            if element.tag != "input" && element.tag != "textarea" {
                continue;
            }
            if element.get_attr("type") == Some("submit") {
                continue;
            }
            if let Some(name) = element.get_attr("name") {
                submission.push(name, input_value(element));
            }
        }
        submission
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
    }

    /// First value posted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Read the blocks of `kind` back out of a submission, the way the page's
/// server side does.
///
/// Reads `num-<kind>s`, then each block's fields for positions 1..=N. Each
/// rendered block posts at least one input, so a count larger than the whole
/// submission is rejected as invalid before any block is read.
/// Values are trimmed and entirely empty blocks are skipped. A partially
/// filled block must supply its required fields, and the kind's unique
/// field may not repeat. All problems are returned together.
pub fn decode(kind: &BlockKind, submission: &Submission) -> Result<Vec<FieldValues>, Vec<EngineError>> {
    let count_field = kind.count_field();
    let raw = submission
        .get(&count_field)
        .ok_or_else(|| vec![EngineError::MissingCount(count_field.clone())])?;
    let count: usize = raw.trim().parse().map_err(|_| {
        vec![EngineError::InvalidCount {
            field: count_field.clone(),
            value: raw.to_string(),
        }]
    })?;
    if count > submission.len() {
        return Err(vec![EngineError::InvalidCount {
            field: count_field,
            value: raw.to_string(),
        }]);
    }

    let mut posted: HashMap<&str, &str> = HashMap::with_capacity(submission.len());
    for field in submission.fields() {
        posted.entry(field.name.as_str()).or_insert(field.value.as_str());
    }

    let mut errors = Vec::new();
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    for position in 1..=count {
        let values: FieldValues = kind
            .fields
            .iter()
            .map(|field| {
                let value = posted
                    .get(kind.field_id(&field.name, position).as_str())
                    .copied()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                (field.name.clone(), value)
            })
            .collect();
        if values.values().all(String::is_empty) {
            continue;
        }
        for field in kind.fields.iter().filter(|f| f.required) {
            if values.get(&field.name).is_none_or(String::is_empty) {
                errors.push(EngineError::MissingRequired {
                    kind: kind.name.clone(),
                    position,
                    label: field.label.clone(),
                });
            }
        }
        if let Some(unique) = &kind.unique {
            if let Some(value) = values.get(unique).filter(|v| !v.is_empty()) {
                if !seen.insert(value.clone()) {
                    errors.push(EngineError::DuplicateValue {
                        kind: kind.name.clone(),
                        field: unique.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        blocks.push(values);
    }

    if errors.is_empty() {
        Ok(blocks)
    } else {
        Err(errors)
    }
}

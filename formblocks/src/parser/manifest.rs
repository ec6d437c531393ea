use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use serde::Deserialize;
use toml::Spanned;

use crate::block::FieldValues;
use crate::kind::{BlockKind, FieldSpec, Floor, Naming, RESERVED_FIELD_NAMES, Widget};
use crate::page::{KindDefinition, PageDefinition};
use crate::parser::error::ParseError;

const DEFAULT_SUBMIT: &str = "Submit";

// ---------------------------------------------------------------------------
// Raw TOML shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    submit: Option<String>,
    #[serde(default, rename = "kind")]
    kinds: Vec<RawKind>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKind {
    name: Spanned<String>,
    #[serde(default)]
    legend: Option<String>,
    #[serde(default)]
    naming: Option<Spanned<String>>,
    #[serde(default)]
    floor: Option<Spanned<i64>>,
    #[serde(default)]
    unique: Option<Spanned<String>>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    initial: Vec<Spanned<BTreeMap<String, String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: Spanned<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    widget: Option<Spanned<String>>,
    #[serde(default)]
    required: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a TOML page manifest and validate its kinds.
pub fn parse_page(source: &str, file_id: usize) -> Result<PageDefinition, Vec<ParseError>> {
    let raw: RawPage =
        toml::from_str(source).map_err(|e| vec![ParseError::from_toml(&e, file_id)])?;

    let mut state = ValidateState::new(file_id);
    if raw.kinds.is_empty() {
        state.errors.push(
            ParseError::error("page declares no repeatable block kinds", 0..0, file_id)
                .with_note("add at least one [[kind]] table"),
        );
    }
    let kinds: Vec<KindDefinition> = raw
        .kinds
        .into_iter()
        .filter_map(|k| state.validate_kind(k))
        .collect();
    state.check_field_collisions(&kinds);

    if !state.errors.is_empty() {
        return Err(state.errors);
    }

    Ok(PageDefinition {
        title: raw.title,
        instructions: raw.instructions,
        submit: raw.submit.unwrap_or_else(|| DEFAULT_SUBMIT.to_string()),
        kinds,
        source_id: file_id,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct ValidateState {
    file_id: usize,
    /// Kind name → span of its first definition.
    seen_kinds: HashMap<String, Range<usize>>,
    errors: Vec<ParseError>,
}

impl ValidateState {
    fn new(file_id: usize) -> Self {
        ValidateState {
            file_id,
            seen_kinds: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Range<usize>) {
        self.errors
            .push(ParseError::error(message, span, self.file_id));
    }

    /// Check one `[[kind]]` entry. Returns `None` if it had errors.
    fn validate_kind(&mut self, raw: RawKind) -> Option<KindDefinition> {
        let errors_before = self.errors.len();
        let name_span = raw.name.span();
        let name = raw.name.into_inner();

        if !is_identifier(&name) {
            self.error(format!("invalid kind name {:?}", name), name_span.clone());
            self.identifier_note();
        } else if let Some(first) = self.seen_kinds.get(&name) {
            let first_line = first.start;
            self.errors.push(
                ParseError::error(
                    format!("kind {:?} is defined more than once", name),
                    name_span.clone(),
                    self.file_id,
                )
                .with_note(format!("first definition starts at byte {}", first_line)),
            );
        } else {
            self.seen_kinds.insert(name.clone(), name_span.clone());
        }

        let naming = match raw.naming {
            None => Naming::default(),
            Some(spanned) => {
                let span = spanned.span();
                match spanned.get_ref().as_str() {
                    "prefixed" => Naming::Prefixed,
                    "bare" => Naming::Bare,
                    other => {
                        self.errors.push(
                            ParseError::error(
                                format!("unknown naming convention {:?}", other),
                                span,
                                self.file_id,
                            )
                            .with_note("expected \"prefixed\" or \"bare\""),
                        );
                        Naming::default()
                    }
                }
            }
        };

        let floor = match raw.floor {
            None => Floor::default(),
            Some(spanned) => {
                let span = spanned.span();
                let value = *spanned.get_ref();
                Floor::from_count(value).unwrap_or_else(|| {
                    self.error(format!("floor must be 0 or 1, got {}", value), span);
                    Floor::default()
                })
            }
        };

        if raw.fields.is_empty() {
            self.error(format!("kind {:?} declares no fields", name), name_span.clone());
        }
        let mut fields: Vec<FieldSpec> = Vec::new();
        for raw_field in raw.fields {
            if let Some(field) = self.validate_field(raw_field, &fields) {
                fields.push(field);
            }
        }

        let legend = raw.legend.unwrap_or_else(|| capitalize(&name));
        let mut kind = BlockKind::new(name, legend, fields)
            .with_naming(naming)
            .with_floor(floor);

        if let Some(unique) = raw.unique {
            let span = unique.span();
            let field = unique.into_inner();
            if kind.has_field(&field) {
                kind = kind.with_unique(field);
            } else {
                self.error(
                    format!("unique field {:?} is not declared by kind {:?}", field, kind.name),
                    span,
                );
            }
        }

        let mut initial: Vec<FieldValues> = Vec::new();
        for entry in raw.initial {
            let span = entry.span();
            let values = entry.into_inner();
            for key in values.keys() {
                if !kind.has_field(key) {
                    self.error(
                        format!("initial values name unknown field {:?} of kind {:?}", key, kind.name),
                        span.clone(),
                    );
                }
            }
            initial.push(values);
        }

        if self.errors.len() > errors_before {
            return None;
        }
        Some(KindDefinition {
            kind,
            initial,
            span: name_span,
        })
    }

    fn validate_field(&mut self, raw: RawField, declared: &[FieldSpec]) -> Option<FieldSpec> {
        let span = raw.name.span();
        let name = raw.name.into_inner();
        if !is_identifier(&name) {
            self.error(format!("invalid field name {:?}", name), span);
            self.identifier_note();
            return None;
        }
        if RESERVED_FIELD_NAMES.contains(&name.as_str()) {
            self.errors.push(
                ParseError::error(format!("field name {:?} is reserved", name), span, self.file_id)
                    .with_note("block and button name the markup generated around each block"),
            );
            return None;
        }
        if declared.iter().any(|f| f.name == name) {
            self.error(format!("field {:?} is declared more than once", name), span);
            return None;
        }
        let widget = match raw.widget {
            None => Widget::Text,
            Some(spanned) => {
                let widget_span = spanned.span();
                match spanned.get_ref().as_str() {
                    "text" => Widget::Text,
                    "textarea" => Widget::TextArea,
                    other => {
                        self.errors.push(
                            ParseError::error(
                                format!("unknown widget {:?}", other),
                                widget_span,
                                self.file_id,
                            )
                            .with_note("expected \"text\" or \"textarea\""),
                        );
                        return None;
                    }
                }
            }
        };
        let label = raw.label.unwrap_or_else(|| capitalize(&name));
        Some(FieldSpec {
            name,
            label,
            widget,
            required: raw.required,
        })
    }

    /// Two kinds must never produce the same input names.
    fn check_field_collisions(&mut self, kinds: &[KindDefinition]) {
        let mut owners: HashMap<String, &str> = HashMap::new();
        for def in kinds {
            for field in &def.kind.fields {
                let prefix = def.kind.field_prefix(&field.name);
                match owners.get(prefix.as_str()).copied() {
                    Some(owner) if owner != def.kind.name => {
                        let message = format!(
                            "inputs named \"{}-<n>\" would be shared by kinds {:?} and {:?}",
                            prefix, owner, def.kind.name
                        );
                        self.errors.push(
                            ParseError::error(message, def.span.clone(), self.file_id)
                                .with_note("use naming = \"prefixed\" for one of them"),
                        );
                    }
                    Some(_) => {}
                    None => {
                        owners.insert(prefix, def.kind.name.as_str());
                    }
                }
            }
        }
    }

    fn identifier_note(&mut self) {
        if let Some(last) = self.errors.pop() {
            self.errors.push(last.with_note(
                "names start with a lowercase letter and use only a-z, 0-9 and _",
            ));
        }
    }
}

/// Kind and field names end up inside `-` separated input names, so they
/// are restricted to lowercase identifiers.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}

//! Gesture scripts: a line-oriented record of what a user did to a form.
//!
//! ```text
//! # comments and blank lines are ignored
//! add server
//! set server 2 alias = Backup
//! set server 2 url = "https://backup.example.org"
//! remove server 1
//! ```

use crate::error::EngineError;
use crate::form::FormState;

/// A single user gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Click the add control of a kind.
    Add { kind: String },
    /// Click the remove control on the block at `position`.
    Remove { kind: String, position: usize },
    /// Type `value` into one field of an existing block.
    Set {
        kind: String,
        position: usize,
        field: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the script source.
    pub line: usize,
    pub gesture: Gesture,
}

pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, EngineError> {
    let mut lines = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let gesture = parse_gesture(text).map_err(|message| EngineError::Syntax { line, message })?;
        lines.push(ScriptLine { line, gesture });
    }
    Ok(lines)
}

fn parse_gesture(text: &str) -> Result<Gesture, String> {
    let (verb, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    match verb {
        "add" => match words(rest).as_slice() {
            [kind] => Ok(Gesture::Add {
                kind: kind.to_string(),
            }),
            _ => Err("expected `add <kind>`".into()),
        },
        "remove" => match words(rest).as_slice() {
            [kind, position] => Ok(Gesture::Remove {
                kind: kind.to_string(),
                position: parse_position(position)?,
            }),
            _ => Err("expected `remove <kind> <position>`".into()),
        },
        "set" => {
            let (target, value) = rest
                .split_once('=')
                .ok_or("expected `set <kind> <position> <field> = <value>`")?;
            match words(target).as_slice() {
                [kind, position, field] => Ok(Gesture::Set {
                    kind: kind.to_string(),
                    position: parse_position(position)?,
                    field: field.to_string(),
                    value: unquote(value.trim()).to_string(),
                }),
                _ => Err("expected `set <kind> <position> <field> = <value>`".into()),
            }
        }
        other => Err(format!("unknown gesture {:?}", other)),
    }
}

fn words(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

fn parse_position(s: &str) -> Result<usize, String> {
    s.parse()
        .map_err(|_| format!("block position must be a number, got {:?}", s))
}

/// Strip one pair of surrounding double quotes, so values can keep edge
/// whitespace or be empty.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

impl FormState {
    pub fn apply(&mut self, gesture: &Gesture) -> Result<(), EngineError> {
        match gesture {
            Gesture::Add { kind } => self.on_add_clicked(kind).map(|_| ()),
            Gesture::Remove { kind, position } => {
                self.on_remove_clicked(kind, *position).map(|_| ())
            }
            Gesture::Set {
                kind,
                position,
                field,
                value,
            } => self.set_field(kind, *position, field, value.as_str()),
        }
    }
}

/// Apply each gesture in order, stopping at the first failure.
pub fn run_script(form: &mut FormState, script: &[ScriptLine]) -> Result<(), EngineError> {
    for step in script {
        tracing::debug!(line = step.line, gesture = ?step.gesture, "applying gesture");
        form.apply(&step.gesture)
            .map_err(|e| e.at_line(step.line))?;
    }
    Ok(())
}

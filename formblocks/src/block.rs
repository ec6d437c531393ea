use std::collections::BTreeMap;

/// Field name → current string value.
pub type FieldValues = BTreeMap<String, String>;

/// One repeatable group of form fields at a position in its registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// 1-based position; the live positions of a kind are always 1..=N.
    pub position: usize,
    /// Name of the kind this block belongs to.
    pub kind: String,
    pub fields: FieldValues,
}

impl Block {
    /// Current value of `field`, or "" when the schema has no such field.
    pub fn value(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    /// True when every field is empty (or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|v| v.trim().is_empty())
    }
}

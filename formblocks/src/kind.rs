use crate::block::FieldValues;

/// How a field is presented inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Widget {
    /// Single-line `<input>`.
    #[default]
    Text,
    /// Multi-line `<textarea>`, for longer values such as rule text.
    TextArea,
}

/// Field names that would share a class or id with a kind's own markup,
/// `<kind>-block` for the fieldset and `<kind>-button` for its controls.
pub const RESERVED_FIELD_NAMES: &[&str] = &["block", "button"];

/// One entry in a kind's field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name, used to derive input names and ids.
    pub name: String,
    /// Human-readable label shown next to the input.
    pub label: String,
    pub widget: Widget,
    /// A partially filled block must supply this field on submission.
    pub required: bool,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            label: label.into(),
            widget: Widget::Text,
            required: false,
        }
    }

    pub fn textarea(name: impl Into<String>, label: impl Into<String>) -> Self {
        FieldSpec {
            widget: Widget::TextArea,
            ..FieldSpec::text(name, label)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Naming convention for the inputs of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Naming {
    /// `<kind>-<field>-<position>`
    #[default]
    Prefixed,
    /// `<field>-<position>`, for simple list kinds.
    Bare,
}

/// Minimum number of blocks a kind keeps rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Floor {
    /// The list may become empty (e.g. free-form search terms).
    None,
    /// At least one block is always present; removing the last one
    /// leaves a single empty block behind.
    #[default]
    One,
}

impl Floor {
    pub fn min_blocks(self) -> usize {
        match self {
            Floor::None => 0,
            Floor::One => 1,
        }
    }

    pub fn from_count(n: i64) -> Option<Floor> {
        match n {
            0 => Some(Floor::None),
            1 => Some(Floor::One),
            _ => None,
        }
    }
}

/// The schema shared by every block of one repeatable list on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockKind {
    /// Kind name, e.g. "server" or "opt". Lowercase identifier.
    pub name: String,
    /// Legend printed at the top of each block.
    pub legend: String,
    /// Ordered field schema.
    pub fields: Vec<FieldSpec>,
    pub naming: Naming,
    pub floor: Floor,
    /// Field whose non-empty values must be distinct across blocks.
    pub unique: Option<String>,
}

impl BlockKind {
    pub fn new(name: impl Into<String>, legend: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        BlockKind {
            name: name.into(),
            legend: legend.into(),
            fields,
            naming: Naming::default(),
            floor: Floor::default(),
            unique: None,
        }
    }

    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_floor(mut self, floor: Floor) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_unique(mut self, field: impl Into<String>) -> Self {
        self.unique = Some(field.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Prefix shared by every input name of `field`, without the position.
    pub fn field_prefix(&self, field: &str) -> String {
        match self.naming {
            Naming::Prefixed => format!("{}-{}", self.name, field),
            Naming::Bare => field.to_string(),
        }
    }

    /// Input name and id for `field` in the block at `position`.
    pub fn field_id(&self, field: &str, position: usize) -> String {
        format!("{}-{}", self.field_prefix(field), position)
    }

    pub fn block_class(&self) -> String {
        format!("{}-block", self.name)
    }

    pub fn block_id(&self, position: usize) -> String {
        format!("{}-block-{}", self.name, position)
    }

    /// Hidden field mirroring the block count, e.g. `num-servers`.
    pub fn count_field(&self) -> String {
        format!("num-{}s", self.name)
    }

    /// Marker element new blocks are inserted in front of.
    pub fn anchor_id(&self) -> String {
        format!("{}-anchor", self.name)
    }

    pub fn button_class(&self) -> String {
        format!("{}-button", self.name)
    }

    /// Every schema field mapped to the empty string.
    pub fn empty_values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), String::new()))
            .collect()
    }

    /// Restrict `values` to this kind's schema, filling gaps with "".
    pub fn normalize(&self, mut values: FieldValues) -> FieldValues {
        let dropped: Vec<String> = values
            .keys()
            .filter(|k| !self.has_field(k))
            .cloned()
            .collect();
        if !dropped.is_empty() {
            tracing::warn!(kind = %self.name, fields = ?dropped, "dropping values for unknown fields");
        }
        let mut out = FieldValues::new();
        for field in &self.fields {
            let value = values.remove(&field.name).unwrap_or_default();
            out.insert(field.name.clone(), value);
        }
        out
    }
}

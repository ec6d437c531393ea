use std::ops::Range;

use crate::block::FieldValues;
use crate::kind::BlockKind;

/// A parsed page manifest: everything needed to render the form.
#[derive(Debug, Clone)]
pub struct PageDefinition {
    pub title: String,
    /// Markdown shown in an "Instructions" fieldset above the blocks.
    pub instructions: Option<String>,
    /// Label of the submit button.
    pub submit: String,
    /// Repeatable lists, in page order.
    pub kinds: Vec<KindDefinition>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

/// One repeatable list on the page, with the values the server supplied.
#[derive(Debug, Clone)]
pub struct KindDefinition {
    pub kind: BlockKind,
    pub initial: Vec<FieldValues>,
    /// Byte span of the `[[kind]]` entry's name in the manifest.
    pub span: Range<usize>,
}

impl PageDefinition {
    pub fn kind(&self, name: &str) -> Option<&KindDefinition> {
        self.kinds.iter().find(|k| k.kind.name == name)
    }

    pub fn kind_names(&self) -> Vec<&str> {
        self.kinds.iter().map(|k| k.kind.name.as_str()).collect()
    }
}

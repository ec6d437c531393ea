use thiserror::Error;

use crate::block::{Block, FieldValues};
use crate::kind::BlockKind;

/// Errors from editing a block that does not exist.
///
/// Structural mutations never fail: appends always succeed and removal of an
/// unknown position is a no-op.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("{kind} block {position} does not exist (have {count})")]
    NoSuchBlock {
        kind: String,
        position: usize,
        count: usize,
    },

    #[error("{kind} blocks have no field named {field:?}")]
    UnknownField { kind: String, field: String },
}

/// The ordered, live set of blocks of one kind.
///
/// This is the single source of truth for a kind's state. Positions are
/// kept contiguous (1..=N) after every mutation, and N never drops below
/// the kind's floor.
#[derive(Debug, Clone)]
pub struct Registry {
    kind: BlockKind,
    blocks: Vec<Block>,
}

impl Registry {
    /// An empty registry, topped up to the kind's floor.
    pub fn new(kind: BlockKind) -> Self {
        Self::with_initial(kind, Vec::new())
    }

    /// Registry seeded with server-supplied values at positions 1..=N.
    pub fn with_initial(kind: BlockKind, initial: Vec<FieldValues>) -> Self {
        let mut registry = Registry {
            kind,
            blocks: Vec::new(),
        };
        for values in initial {
            registry.push(values);
        }
        registry.heal();
        registry
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Value for the mirrored `num-<kind>s` field.
    pub fn count_value(&self) -> String {
        self.blocks.len().to_string()
    }

    pub fn get(&self, position: usize) -> Option<&Block> {
        position
            .checked_sub(1)
            .and_then(|index| self.blocks.get(index))
    }

    /// Insert a block at position N+1 and return that position.
    /// Missing values default to "".
    pub fn append(&mut self, values: Option<FieldValues>) -> usize {
        let position = self.push(values.unwrap_or_default());
        tracing::debug!(kind = %self.kind.name, position, "appended block");
        position
    }

    /// Drop the block at `position` and renumber the survivors to 1..=N-1,
    /// keeping their relative order and values. Returns false (and changes
    /// nothing) when `position` is outside 1..=N.
    pub fn remove_and_renumber(&mut self, position: usize) -> bool {
        if position == 0 || position > self.blocks.len() {
            tracing::debug!(
                kind = %self.kind.name,
                position,
                count = self.blocks.len(),
                "ignoring removal of missing block"
            );
            return false;
        }
        tracing::debug!(kind = %self.kind.name, position, "removing block");
        let survivors = self.collect(Some(position));
        self.blocks.clear();
        for block in survivors {
            self.push(block.fields);
        }
        if self.heal() {
            tracing::debug!(kind = %self.kind.name, "registry emptied, restored placeholder block");
        }
        true
    }

    /// Snapshot of the blocks in position order, leaving out `skip`.
    pub fn collect(&self, skip: Option<usize>) -> Vec<Block> {
        self.blocks
            .iter()
            .filter(|b| Some(b.position) != skip)
            .cloned()
            .collect()
    }

    /// Record a value typed into one field of an existing block.
    pub fn set_value(
        &mut self,
        position: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), RegistryError> {
        if !self.kind.has_field(field) {
            return Err(RegistryError::UnknownField {
                kind: self.kind.name.clone(),
                field: field.to_string(),
            });
        }
        let count = self.blocks.len();
        let block = position
            .checked_sub(1)
            .and_then(|index| self.blocks.get_mut(index))
            .ok_or_else(|| RegistryError::NoSuchBlock {
                kind: self.kind.name.clone(),
                position,
                count,
            })?;
        block.fields.insert(field.to_string(), value.into());
        Ok(())
    }

    fn push(&mut self, values: FieldValues) -> usize {
        let position = self.blocks.len() + 1;
        self.blocks.push(Block {
            position,
            kind: self.kind.name.clone(),
            fields: self.kind.normalize(values),
        });
        position
    }

    /// Append empty blocks until the floor holds. Returns true if any were added.
    fn heal(&mut self) -> bool {
        let mut healed = false;
        while self.blocks.len() < self.kind.floor.min_blocks() {
            self.push(FieldValues::new());
            healed = true;
        }
        healed
    }
}

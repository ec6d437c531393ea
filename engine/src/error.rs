use thiserror::Error;

use formblocks::RegistryError;

/// Errors raised while driving a form or decoding what it submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("page has no block kind named {0:?}")]
    UnknownKind(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("submission has no {0} field")]
    MissingCount(String),

    #[error("invalid block count {value:?} in {field}")]
    InvalidCount { field: String, value: String },

    #[error("{kind} block {position}: missing {label}")]
    MissingRequired {
        kind: String,
        position: usize,
        label: String,
    },

    #[error("duplicate {field} {value:?} in {kind} blocks")]
    DuplicateValue {
        kind: String,
        field: String,
        value: String,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Attach the 1-based script line the error came from.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            EngineError::Syntax { .. } | EngineError::AtLine { .. } => self,
            other => EngineError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }
}

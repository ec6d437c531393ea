pub mod block;
pub mod kind;
pub mod markup;
pub mod page;
pub mod parser;
pub mod registry;
pub mod render;

pub use block::{Block, FieldValues};
pub use kind::{BlockKind, FieldSpec, Floor, Naming, RESERVED_FIELD_NAMES, Widget};
pub use page::{KindDefinition, PageDefinition};
pub use registry::{Registry, RegistryError};

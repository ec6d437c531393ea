pub mod error;
mod manifest;

pub use error::ParseError;

use crate::page::PageDefinition;

/// Page manifest parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse and validate the TOML manifest into a PageDefinition.
    /// Every problem found is reported, not only the first.
    pub fn parse(&self) -> Result<PageDefinition, Vec<ParseError>> {
        manifest::parse_page(&self.source, self.file_id)
    }
}

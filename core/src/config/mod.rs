//! Fight definition files.

mod error;
mod loader;

pub use error::DefinitionError;
pub use loader::{
    bundled_definition, load_definition, load_definitions_from_dir, parse_definition,
    validate_definition,
};

//! Storage collaborator: the ordered id to document map behind a collection.

mod document_map;
mod memory;

pub use document_map::*;
pub use memory::*;

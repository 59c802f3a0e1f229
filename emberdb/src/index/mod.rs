//! Index metadata and data structures: index kinds and options, the
//! per-field build guard, ordered value indexes and full-text indexers.
//!
//! The catalog that ties them to a collection lives in
//! `collection::operation`.

mod build_guard;
mod descriptor;
mod options;
pub mod text;
mod value_index;

pub(crate) use build_guard::*;
pub use descriptor::*;
pub use options::*;
pub use text::{InMemoryTextIndexer, NoOpTextIndexer, TextIndexer};
pub(crate) use value_index::*;

//! # EmberDb - Embedded Document Store
//!
//! EmberDb is the query and indexing core of an embedded, schema-less
//! document store. Documents are ordered maps of field names to [`Value`]s,
//! grouped into named collections and addressed by a unique [`DocId`].
//!
//! ## Key Features
//!
//! - **Indexes**: unique, non-unique and full-text indexes per field, built
//!   synchronously or in the background with a per-field build guard
//! - **Filters**: a composable filter tree resolved from indexes where
//!   possible and by scanning otherwise
//! - **Cursors**: restartable, read-only result cursors with pagination,
//!   projection and joins across collections
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use emberdb::doc;
//! use emberdb::ember::EmberDb;
//! use emberdb::filter::field;
//!
//! let db = EmberDb::builder().open()?;
//! let users = db.collection("users")?;
//!
//! users.insert(doc! { name: "Ada", age: 36 })?;
//! users.create_index("age", None)?;
//!
//! let cursor = users.find(field("age").gt(30))?;
//! for document in cursor.iter() {
//!     println!("{}", document);
//! }
//!
//! db.close()?;
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Collections, documents, ids and find options
//! - [`common`] - Values, sort order, cursors and shared utilities
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - The filter tree and its fluent builders
//! - [`index`] - Index descriptors, options and text indexers
//! - [`store`] - The document map behind every collection
//! - [`ember`] - The database handle
//! - [`ember_builder`] - Builder for opening a database
//! - [`ember_config`] - Database configuration

use crate::collection::snowflake::SnowflakeIdGenerator;
use crate::common::DEFAULT_FIELD_SEPARATOR;
use parking_lot::RwLock;
use std::sync::LazyLock;
use std::thread::available_parallelism;

pub mod collection;
pub mod common;
pub mod ember;
pub mod ember_builder;
pub mod ember_config;
pub mod errors;
pub mod filter;
pub mod index;
pub mod store;

pub use collection::{Collection, DocId, Document};
pub use common::{SortOrder, Value};
pub use ember::EmberDb;
pub use errors::{EmberError, EmberResult, ErrorKind};

pub(crate) static FIELD_SEPARATOR: LazyLock<RwLock<String>> =
    LazyLock::new(|| RwLock::new(DEFAULT_FIELD_SEPARATOR.to_string()));
pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);

/// The separator of nested field paths installed by the last opened database.
pub(crate) fn field_separator() -> String {
    FIELD_SEPARATOR.read().clone()
}

/// Returns the number of available CPU cores, or 1 when it cannot be
/// detected.
///
/// ```rust
/// use emberdb::get_cpu_count;
///
/// assert!(get_cpu_count() > 0);
/// ```
pub fn get_cpu_count() -> usize {
    available_parallelism()
        .map(|p| p.get())
        .unwrap_or_else(|err| {
            log::warn!(
                "Failed to detect available parallelism: {}. Defaulting to single thread.",
                err
            );
            1
        })
}

use crate::common::{FULL_TEXT_INDEX, NON_UNIQUE_INDEX, UNIQUE_INDEX};
use std::fmt::Display;

/// Kind of a per-field index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexKind {
    /// Ordered value index that rejects a second document with an equal value.
    Unique,
    /// Ordered value index allowing duplicate values.
    NonUnique,
    /// Token index maintained by the collection's text indexer.
    Fulltext,
}

impl IndexKind {
    pub fn is_value_index(&self) -> bool {
        matches!(self, IndexKind::Unique | IndexKind::NonUnique)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Unique => UNIQUE_INDEX,
            IndexKind::NonUnique => NON_UNIQUE_INDEX,
            IndexKind::Fulltext => FULL_TEXT_INDEX,
        }
    }
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for creating an index.
///
/// Defaults to a synchronous [`IndexKind::NonUnique`] build.
///
/// ```text
/// collection.create_index("email", Some(index_options(IndexKind::Unique)))?;
/// collection.create_index("bio", Some(IndexOptions::async_of(IndexKind::Fulltext)))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    kind: IndexKind,
    is_async: bool,
}

impl IndexOptions {
    pub fn new(kind: IndexKind, is_async: bool) -> Self {
        IndexOptions { kind, is_async }
    }

    /// Options for a background build of `kind`.
    pub fn async_of(kind: IndexKind) -> Self {
        IndexOptions {
            kind,
            is_async: true,
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            kind: IndexKind::NonUnique,
            is_async: false,
        }
    }
}

/// Synchronous build options for `kind`.
#[inline]
pub fn index_options(kind: IndexKind) -> IndexOptions {
    IndexOptions::new(kind, false)
}

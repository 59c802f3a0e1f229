use crate::collection::Document;
use crate::common::stream::document_cursor::{removal_not_supported, DocumentCursor, DocumentIter};
use crate::common::Value;
use crate::errors::EmberResult;
use itertools::Itertools;
use std::fmt::{Debug, Formatter};

/// Join specification: documents of the foreign cursor whose
/// `foreign_field` equals the local document's `local_field` are collected
/// into `target_field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub local_field: String,
    pub foreign_field: String,
    pub target_field: String,
}

impl Lookup {
    pub fn new(local_field: &str, foreign_field: &str, target_field: &str) -> Self {
        Lookup {
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            target_field: target_field.to_string(),
        }
    }
}

/// Joins `local` with `foreign`. Equivalent to `local.join(foreign, lookup)`.
pub fn join(local: &DocumentCursor, foreign: &DocumentCursor, lookup: &Lookup) -> JoinedCursor {
    local.join(foreign, lookup)
}

/// Nested loop join of two cursors.
///
/// The foreign cursor is traversed from its start for every local
/// document. Local documents with an absent or null local field, or without
/// any match, are produced unchanged. Otherwise the target field is set to
/// an array of the distinct matching foreign documents, in foreign order.
#[derive(Clone)]
pub struct JoinedCursor {
    local: DocumentCursor,
    foreign: DocumentCursor,
    lookup: Lookup,
}

impl JoinedCursor {
    pub(crate) fn new(local: DocumentCursor, foreign: DocumentCursor, lookup: Lookup) -> Self {
        JoinedCursor {
            local,
            foreign,
            lookup,
        }
    }

    pub fn iter(&self) -> JoinedIter {
        JoinedIter {
            local: self.local.iter(),
            foreign: self.foreign.clone(),
            lookup: self.lookup.clone(),
        }
    }

    /// Number of local documents in the page being joined.
    pub fn size(&self) -> usize {
        self.local.size()
    }

    pub fn total_count(&self) -> usize {
        self.local.total_count()
    }

    pub fn has_more(&self) -> bool {
        self.local.has_more()
    }

    pub fn first(&self) -> EmberResult<Option<Document>> {
        self.iter().next().transpose()
    }

    pub fn to_vec(&self) -> EmberResult<Vec<Document>> {
        self.iter().collect()
    }
}

impl Debug for JoinedCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinedCursor")
            .field("size", &self.size())
            .field("total_count", &self.total_count())
            .field("has_more", &self.has_more())
            .field("lookup", &self.lookup)
            .finish()
    }
}

impl<'a> IntoIterator for &'a JoinedCursor {
    type Item = EmberResult<Document>;
    type IntoIter = JoinedIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct JoinedIter {
    local: DocumentIter,
    foreign: DocumentCursor,
    lookup: Lookup,
}

impl JoinedIter {
    pub fn remove(&mut self) -> EmberResult<()> {
        Err(removal_not_supported())
    }

    fn join_document(&self, mut local: Document) -> EmberResult<Document> {
        let local_value = match local.get(&self.lookup.local_field)? {
            Some(value) if !value.is_null() => value,
            _ => return Ok(local),
        };

        let mut matched = Vec::new();
        for foreign in self.foreign.iter() {
            let foreign = foreign?;
            if foreign.get(&self.lookup.foreign_field)?.as_ref() == Some(&local_value) {
                matched.push(foreign);
            }
        }

        if !matched.is_empty() {
            let target: Vec<Value> = matched.into_iter().unique().map(Value::Document).collect();
            local.put(&self.lookup.target_field, Value::Array(target))?;
        }
        Ok(local)
    }
}

impl Iterator for JoinedIter {
    type Item = EmberResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.local.next()? {
            Ok(local) => Some(self.join_document(local)),
            Err(err) => {
                log::error!("Error reading local document of join: {}", err);
                Some(Err(err))
            }
        }
    }
}

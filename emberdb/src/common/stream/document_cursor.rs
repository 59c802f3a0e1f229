use crate::collection::{DocId, Document, FindResult};
use crate::common::stream::joined_cursor::{JoinedCursor, Lookup};
use crate::common::stream::projected_cursor::ProjectedCursor;
use crate::errors::{EmberError, EmberResult, ErrorKind};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Read-only view over the result of a find.
///
/// The cursor holds only the resolved ids and a handle to the collection's
/// document map. Each traversal re-reads documents from the map, so a
/// cursor can be iterated any number of times and observes writes made in
/// between: documents removed since the query are skipped, updated ones are
/// returned in their current form. Every produced document is a detached
/// copy.
#[derive(Clone)]
pub struct DocumentCursor {
    result: Arc<FindResult>,
}

impl DocumentCursor {
    pub(crate) fn new(result: FindResult) -> Self {
        DocumentCursor {
            result: Arc::new(result),
        }
    }

    /// Starts a fresh traversal.
    pub fn iter(&self) -> DocumentIter {
        DocumentIter {
            result: self.result.clone(),
            position: 0,
        }
    }

    /// Number of ids in this page of the result.
    pub fn size(&self) -> usize {
        self.result.ids.len()
    }

    /// Number of matching documents before pagination.
    pub fn total_count(&self) -> usize {
        self.result.total_count
    }

    /// Whether matching documents exist beyond this page.
    pub fn has_more(&self) -> bool {
        self.result.has_more
    }

    pub fn ids(&self) -> &[DocId] {
        &self.result.ids
    }

    pub fn first(&self) -> EmberResult<Option<Document>> {
        self.iter().next().transpose()
    }

    pub fn to_vec(&self) -> EmberResult<Vec<Document>> {
        self.iter().collect()
    }

    /// Reduces every document to the fields named in `shape`.
    ///
    /// `shape` is a document whose leaves are all null, e.g.
    /// `doc!{ name: (Value::Null), address: { city: (Value::Null) } }`.
    pub fn project(&self, shape: &Document) -> EmberResult<ProjectedCursor> {
        ProjectedCursor::new(self.clone(), shape)
    }

    /// Augments every document with the matching documents of `foreign`.
    pub fn join(&self, foreign: &DocumentCursor, lookup: &Lookup) -> JoinedCursor {
        JoinedCursor::new(self.clone(), foreign.clone(), lookup.clone())
    }
}

impl Debug for DocumentCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCursor")
            .field("size", &self.size())
            .field("total_count", &self.total_count())
            .field("has_more", &self.has_more())
            .finish()
    }
}

impl<'a> IntoIterator for &'a DocumentCursor {
    type Item = EmberResult<Document>;
    type IntoIter = DocumentIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One traversal of a [DocumentCursor].
pub struct DocumentIter {
    result: Arc<FindResult>,
    position: usize,
}

impl DocumentIter {
    /// Always fails: a cursor cannot modify its collection.
    pub fn remove(&mut self) -> EmberResult<()> {
        Err(removal_not_supported())
    }
}

impl Iterator for DocumentIter {
    type Item = EmberResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = *self.result.ids.get(self.position)?;
            self.position += 1;
            match self.result.document_map.get(&id) {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.result.ids.len() - self.position))
    }
}

pub(crate) fn removal_not_supported() -> EmberError {
    log::error!("Removal is not supported on a cursor");
    EmberError::new(
        "removal is not supported on a cursor",
        ErrorKind::InvalidOperation,
    )
}

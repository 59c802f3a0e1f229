use crate::collection::{DocId, Document};
use crate::errors::EmberResult;
use std::ops::Deref;
use std::sync::Arc;

/// Lazy iterator over `(id, document)` pairs in ascending id order.
pub type EntryIterator = Box<dyn Iterator<Item = (DocId, Document)> + Send>;

/// Contract for the ordered key-value map backing a collection.
///
/// Implementations must offer atomic point lookups and iteration in
/// ascending [DocId] order. Iteration is not required to be a snapshot:
/// writes that land while an iterator is live may or may not be observed.
pub trait MapProvider: Send + Sync {
    fn contains_key(&self, id: &DocId) -> EmberResult<bool>;

    fn get(&self, id: &DocId) -> EmberResult<Option<Document>>;

    /// Inserts or replaces the document stored under `id`.
    fn put(&self, id: DocId, document: Document) -> EmberResult<()>;

    fn remove(&self, id: &DocId) -> EmberResult<Option<Document>>;

    fn size(&self) -> EmberResult<usize>;

    fn entries(&self) -> EmberResult<EntryIterator>;

    fn clear(&self) -> EmberResult<()>;

    fn ids(&self) -> EmberResult<Box<dyn Iterator<Item = DocId> + Send>> {
        Ok(Box::new(self.entries()?.map(|(id, _)| id)))
    }

    fn is_empty(&self) -> EmberResult<bool> {
        Ok(self.size()? == 0)
    }
}

/// Cheaply clonable handle to a [MapProvider], shared by a
/// collection, its cursors and its index builds.
#[derive(Clone)]
pub struct DocumentMap {
    inner: Arc<dyn MapProvider>,
}

impl Deref for DocumentMap {
    type Target = Arc<dyn MapProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DocumentMap {
    pub fn new<T: MapProvider + 'static>(inner: T) -> Self {
        DocumentMap {
            inner: Arc::new(inner),
        }
    }
}
